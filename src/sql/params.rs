//! Bindable parameter values and named-placeholder statements.

use crate::error::AppError;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgArguments, PgTypeInfo, Postgres};
use sqlx::query::Query;
use sqlx::{Database, Type};
use std::collections::HashMap;

/// A value that can be bound to a PostgreSQL query.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    /// SQL NULL in a jsonb slot.
    Null,
    Bool(bool),
    I32(i32),
    /// SQL NULL in an int4 slot.
    NullI32,
    I64(i64),
    F64(f64),
    String(String),
    Json(Value),
}

impl PgBindValue {
    /// Map a JSON scalar to its natural column type; arrays and objects bind as jsonb.
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::Bool(b) => PgBindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PgBindValue::I64(i)
                } else {
                    PgBindValue::F64(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => PgBindValue::String(s.clone()),
            Value::Array(_) | Value::Object(_) => PgBindValue::Json(v.clone()),
        }
    }
}

impl From<i32> for PgBindValue {
    fn from(v: i32) -> Self {
        PgBindValue::I32(v)
    }
}

impl From<Option<i32>> for PgBindValue {
    fn from(v: Option<i32>) -> Self {
        v.map_or(PgBindValue::NullI32, PgBindValue::I32)
    }
}

impl From<i64> for PgBindValue {
    fn from(v: i64) -> Self {
        PgBindValue::I64(v)
    }
}

impl From<bool> for PgBindValue {
    fn from(v: bool) -> Self {
        PgBindValue::Bool(v)
    }
}

impl From<&str> for PgBindValue {
    fn from(v: &str) -> Self {
        PgBindValue::String(v.to_string())
    }
}

impl From<String> for PgBindValue {
    fn from(v: String) -> Self {
        PgBindValue::String(v)
    }
}

impl From<Value> for PgBindValue {
    fn from(v: Value) -> Self {
        PgBindValue::Json(v)
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null | PgBindValue::NullI32 => IsNull::Yes,
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            PgBindValue::I32(n) => <i32 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::String(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
            PgBindValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgBindValue::Null => <Value as Type<Postgres>>::type_info(),
            PgBindValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            PgBindValue::I32(_) | PgBindValue::NullI32 => <i32 as Type<Postgres>>::type_info(),
            PgBindValue::I64(_) => <i64 as Type<Postgres>>::type_info(),
            PgBindValue::F64(_) => <f64 as Type<Postgres>>::type_info(),
            PgBindValue::String(_) => <String as Type<Postgres>>::type_info(),
            PgBindValue::Json(_) => <Value as Type<Postgres>>::type_info(),
        })
    }
}

/// Only consulted when `produces` is silent, which no variant is. NULLs carry their
/// column type so a statement prepared with a NULL keeps the same parameter types
/// when the same text is later bound with values.
impl Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        <Value as Type<Postgres>>::type_info()
    }
}

/// A statement ready to execute: positional SQL and its parameters in `$n` order.
#[derive(Clone, Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    /// Statement without parameters (DDL, catalog probes).
    pub fn raw(sql: impl Into<String>) -> Self {
        QueryBuf {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Rewrite `:NAME` placeholders to `$n`, binding values from `args` by name.
    /// A name used more than once shares one position. `::type` casts, quoted literals
    /// and quoted identifiers are left untouched.
    pub fn named(template: &str, args: &[(&str, PgBindValue)]) -> Result<Self, AppError> {
        let by_name: HashMap<&str, &PgBindValue> = args.iter().map(|(k, v)| (*k, v)).collect();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut q = QueryBuf {
            sql: String::with_capacity(template.len()),
            params: Vec::new(),
        };

        let bytes = template.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i];
            match c {
                b'\'' | b'"' => {
                    let end = find_closing(bytes, i, c);
                    q.sql.push_str(&template[i..end]);
                    i = end;
                }
                b':' if i + 1 < bytes.len() && bytes[i + 1] == b':' => {
                    q.sql.push_str("::");
                    i += 2;
                }
                b':' if i + 1 < bytes.len() && is_ident_start(bytes[i + 1]) => {
                    let start = i + 1;
                    let mut end = start;
                    while end < bytes.len() && is_ident_char(bytes[end]) {
                        end += 1;
                    }
                    let name = &template[start..end];
                    let n = match positions.get(name) {
                        Some(n) => *n,
                        None => {
                            let value = by_name.get(name).ok_or_else(|| {
                                AppError::Statement(format!("no value bound for :{}", name))
                            })?;
                            q.params.push((*value).clone());
                            positions.insert(name, q.params.len());
                            q.params.len()
                        }
                    };
                    q.sql.push('$');
                    q.sql.push_str(&n.to_string());
                    i = end;
                }
                _ => {
                    let ch = template[i..].chars().next().unwrap_or_default();
                    q.sql.push(ch);
                    i += ch.len_utf8().max(1);
                }
            }
        }
        Ok(q)
    }

    /// Build an sqlx query with every parameter bound in order.
    pub fn to_query(&self) -> Query<'_, Postgres, PgArguments> {
        let mut query = sqlx::query(&self.sql);
        for p in &self.params {
            query = query.bind(p.clone());
        }
        query
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Index just past the quote closing the one at `open`; doubled quotes are escapes.
fn find_closing(bytes: &[u8], open: usize, quote: u8) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if i + 1 < bytes.len() && bytes[i + 1] == quote {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}
