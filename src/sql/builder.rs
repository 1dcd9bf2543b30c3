//! Parameterized SELECT, INSERT, UPDATE, DELETE for provisioned data tables.
//! Identifiers come only from a validated `TableRef`; values are always bound.

use crate::descriptor::{DescriptorKind, TableRef};
use crate::error::AppError;
use crate::sql::{PgBindValue, QueryBuf};
use serde_json::Value;

/// Column list read back for every record of a kind, in row order.
pub fn record_columns(kind: DescriptorKind) -> &'static str {
    match kind {
        DescriptorKind::Entity => "id, extra",
        DescriptorKind::Dictionary => "id, name, pid, ord, extra",
    }
}

/// Reserved dictionary fields bound on write.
pub struct DictionaryFields {
    pub name: String,
    pub pid: Option<i32>,
    pub ord: Option<i32>,
    pub extra: Value,
}

/// All entity rows, by id.
pub fn select_all(kind: DescriptorKind, table: &TableRef) -> QueryBuf {
    QueryBuf::raw(format!(
        "select {}\n  from {}\n order by id",
        record_columns(kind),
        table.quoted_full_name()
    ))
}

/// Dictionary rows without tree ordering: siblings order, then name, then id.
pub fn select_flat(table: &TableRef) -> QueryBuf {
    QueryBuf::raw(format!(
        "select {}\n  from {}\n order by ord nulls last, name, id",
        record_columns(DescriptorKind::Dictionary),
        table.quoted_full_name()
    ))
}

/// Pre-order listing of a dictionary tree, computed in the database.
///
/// Each row gets its rank among its siblings (by `ord`, then `name`, then `id`); the
/// recursive part walks down from the roots appending ranks, so the accumulated path
/// sorts parents before children and siblings in rank order. Rows unreachable from a
/// root are not listed.
pub fn select_hierarchy(table: &TableRef) -> QueryBuf {
    let full = table.quoted_full_name();
    QueryBuf::raw(format!(
        r#"with recursive ranked as (
    select id,
           name,
           pid,
           ord,
           extra,
           row_number() over (partition by pid order by ord nulls last, name, id)::int4 as pos
      from {full}
), dat as (
    select id,
           name,
           pid,
           ord,
           extra,
           array[pos] as hier
      from ranked
     where pid is null
     --
     union all
     --
    select a.id,
           a.name,
           a.pid,
           a.ord,
           a.extra,
           b.hier || a.pos
      from ranked as a
      join dat as b on b.id = a.pid
)
select id,
       name,
       pid,
       ord,
       extra
  from dat
 order by hier, ord, name"#
    ))
}

pub fn select_by_id(kind: DescriptorKind, table: &TableRef, id: i32) -> Result<QueryBuf, AppError> {
    QueryBuf::named(
        &format!(
            "select {}\n  from {}\n where id = :P_ID",
            record_columns(kind),
            table.quoted_full_name()
        ),
        &[("P_ID", id.into())],
    )
}

/// INSERT returning the generated id.
pub fn insert_entity(table: &TableRef, extra: Value) -> Result<QueryBuf, AppError> {
    QueryBuf::named(
        &format!(
            "insert into {}\n(extra)\nvalues\n(:P_EXTRA::jsonb)\nreturning id",
            table.quoted_full_name()
        ),
        &[("P_EXTRA", PgBindValue::Json(extra))],
    )
}

pub fn update_entity(table: &TableRef, id: i32, extra: Value) -> Result<QueryBuf, AppError> {
    QueryBuf::named(
        &format!(
            "update {}\n   set extra = :P_EXTRA::jsonb\n where id = :P_ID",
            table.quoted_full_name()
        ),
        &[("P_EXTRA", PgBindValue::Json(extra)), ("P_ID", id.into())],
    )
}

/// INSERT returning the generated id.
pub fn insert_dictionary(table: &TableRef, fields: DictionaryFields) -> Result<QueryBuf, AppError> {
    QueryBuf::named(
        &format!(
            "insert into {}\n(name, pid, ord, extra)\nvalues\n(:P_NAME::text, :P_PID::int4, :P_ORD::int4, :P_EXTRA::jsonb)\nreturning id",
            table.quoted_full_name()
        ),
        &dictionary_args(fields),
    )
}

pub fn update_dictionary(
    table: &TableRef,
    id: i32,
    fields: DictionaryFields,
) -> Result<QueryBuf, AppError> {
    let mut args = dictionary_args(fields);
    args.push(("P_ID", id.into()));
    QueryBuf::named(
        &format!(
            r#"update {}
   set name = :P_NAME::text,
       pid = :P_PID::int4,
       ord = :P_ORD::int4,
       extra = :P_EXTRA::jsonb
 where id = :P_ID"#,
            table.quoted_full_name()
        ),
        &args,
    )
}

fn dictionary_args(fields: DictionaryFields) -> Vec<(&'static str, PgBindValue)> {
    vec![
        ("P_NAME", fields.name.into()),
        ("P_PID", fields.pid.into()),
        ("P_ORD", fields.ord.into()),
        ("P_EXTRA", PgBindValue::Json(fields.extra)),
    ]
}

pub fn delete(table: &TableRef, id: i32) -> Result<QueryBuf, AppError> {
    QueryBuf::named(
        &format!("delete from {}\n where id = :P_ID", table.quoted_full_name()),
        &[("P_ID", id.into())],
    )
}
