//! Entity and dictionary descriptors: the metadata that names a collection and its backing table.

mod resolver;

pub use resolver::DescriptorResolver;

use crate::error::AppError;
use crate::sql::{quote_identifier, validate_identifier};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Which record protocol a descriptor's table follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
    /// Flat records: `id` plus an opaque `extra` payload.
    Entity,
    /// Tree-shaped records: `id`, `name`, `pid`, `ord` plus `extra`.
    Dictionary,
}

impl DescriptorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptorKind::Entity => "entity",
            DescriptorKind::Dictionary => "dictionary",
        }
    }

    /// Name of the metadata table that lists descriptors of this kind.
    pub fn metadata_table(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DescriptorKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "entity" => Ok(DescriptorKind::Entity),
            "dictionary" => Ok(DescriptorKind::Dictionary),
            _ => Err(AppError::NotFound(format!("descriptor kind '{}'", s))),
        }
    }
}

/// Kind-specific descriptor fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DescriptorShape {
    Entity,
    Dictionary { is_hierarchical: bool },
}

/// Metadata row for one collection, as fetched. `is_table_exists` is recomputed
/// against the catalog on every fetch and is never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    pub id: i32,
    pub name: String,
    pub schema_name: Option<String>,
    pub table_name: String,
    pub description: String,
    #[serde(flatten)]
    pub shape: DescriptorShape,
    pub is_table_exists: bool,
}

impl Descriptor {
    pub fn kind(&self) -> DescriptorKind {
        match self.shape {
            DescriptorShape::Entity => DescriptorKind::Entity,
            DescriptorShape::Dictionary { .. } => DescriptorKind::Dictionary,
        }
    }

    pub fn is_hierarchical(&self) -> bool {
        matches!(self.shape, DescriptorShape::Dictionary { is_hierarchical: true })
    }

    /// Resolve the backing table: blank schema falls back to `default_schema`, both
    /// parts lower-cased and validated.
    pub fn table_ref(&self, default_schema: &str) -> Result<TableRef, AppError> {
        let schema = self
            .schema_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default_schema);
        TableRef::new(schema, &self.table_name)
    }

    /// Fail unless this descriptor has the expected kind.
    pub fn expect_kind(&self, expected: DescriptorKind) -> Result<(), AppError> {
        let found = self.kind();
        if found == expected {
            Ok(())
        } else {
            Err(AppError::KindMismatch {
                expected: expected.as_str(),
                found: found.as_str(),
            })
        }
    }
}

/// Schema-qualified table name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableRef {
    schema_name: String,
    table_name: String,
}

impl TableRef {
    pub fn new(schema_name: &str, table_name: &str) -> Result<Self, AppError> {
        let schema_name = schema_name.trim().to_lowercase();
        let table_name = table_name.trim().to_lowercase();
        validate_identifier(&schema_name)?;
        validate_identifier(&table_name)?;
        Ok(TableRef {
            schema_name,
            table_name,
        })
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// `schema.table`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }

    /// `"schema"."table"`, the form used in generated SQL.
    pub fn quoted_full_name(&self) -> String {
        format!(
            "{}.{}",
            quote_identifier(&self.schema_name),
            quote_identifier(&self.table_name)
        )
    }

    /// Quoted name of a table-scoped object such as a constraint or index (`<table>_<suffix>`).
    pub fn quoted_object_name(&self, suffix: &str) -> String {
        quote_identifier(&format!("{}_{}", self.table_name, suffix))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema_name, self.table_name)
    }
}

#[cfg(test)]
pub(crate) fn sample(kind: DescriptorKind, table: &str) -> Descriptor {
    Descriptor {
        id: 1,
        name: table.to_string(),
        schema_name: None,
        table_name: table.to_string(),
        description: String::new(),
        shape: match kind {
            DescriptorKind::Entity => DescriptorShape::Entity,
            DescriptorKind::Dictionary => DescriptorShape::Dictionary { is_hierarchical: true },
        },
        is_table_exists: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_ref_lowercases_and_quotes() {
        let t = TableRef::new("Data", "Genres").unwrap();
        assert_eq!(t.full_name(), "data.genres");
        assert_eq!(t.quoted_full_name(), "\"data\".\"genres\"");
        assert_eq!(t.quoted_object_name("pk"), "\"genres_pk\"");
        assert_eq!(t.to_string(), "data.genres");
    }

    #[test]
    fn table_ref_rejects_unsafe_names() {
        assert!(matches!(
            TableRef::new("data", "genres; drop table x"),
            Err(AppError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn blank_schema_falls_back_to_default() {
        let mut d = sample(DescriptorKind::Dictionary, "Genres");
        d.schema_name = Some("  ".into());
        assert_eq!(d.table_ref("data").unwrap().full_name(), "data.genres");
        d.schema_name = Some("Catalog".into());
        assert_eq!(d.table_ref("data").unwrap().full_name(), "catalog.genres");
    }

    #[test]
    fn kind_checks() {
        let d = sample(DescriptorKind::Entity, "movies");
        assert!(d.expect_kind(DescriptorKind::Entity).is_ok());
        assert!(matches!(
            d.expect_kind(DescriptorKind::Dictionary),
            Err(AppError::KindMismatch { expected: "dictionary", found: "entity" })
        ));
        assert!(!d.is_hierarchical());
        assert!(sample(DescriptorKind::Dictionary, "g").is_hierarchical());
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Dictionary".parse::<DescriptorKind>().unwrap(), DescriptorKind::Dictionary);
        assert_eq!("entity".parse::<DescriptorKind>().unwrap(), DescriptorKind::Entity);
        assert!("files".parse::<DescriptorKind>().is_err());
    }

    #[test]
    fn serializes_flat_with_kind_tag() {
        let v = serde_json::to_value(sample(DescriptorKind::Dictionary, "genres")).unwrap();
        assert_eq!(v["kind"], "dictionary");
        assert_eq!(v["is_hierarchical"], true);
        assert_eq!(v["table_name"], "genres");
    }
}
