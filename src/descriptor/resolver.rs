//! Load descriptors from the metadata tables, joined against the live catalog.

use crate::config::EngineConfig;
use crate::db::{Database, SqlExecutor};
use crate::descriptor::{Descriptor, DescriptorKind, DescriptorShape};
use crate::error::AppError;
use crate::sql::{quote_identifier, quote_literal, QueryBuf};
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::sync::OnceLock;

/// Every user relation (tables, partitioned tables, views, materialized views) outside the
/// system schemas.
const CATALOG_TABLES: &str = r#"with tables as (
    select ns.nspname as schema_name,
           c.relname as table_name
      from pg_catalog.pg_class as c
      join pg_catalog.pg_namespace as ns on ns.oid = c.relnamespace
     where ns.nspname !~ '^pg_'
       and ns.nspname <> 'information_schema'
       and c.relkind in ('r', 'p', 'v', 'm')
)"#;

/// Reads descriptors of one kind.
pub struct DescriptorResolver {
    kind: DescriptorKind,
    metadata_schema: String,
    default_schema: String,
    meta_query: OnceLock<String>,
}

impl DescriptorResolver {
    pub fn new(kind: DescriptorKind, config: &EngineConfig) -> Self {
        DescriptorResolver {
            kind,
            metadata_schema: config.metadata_schema.clone(),
            default_schema: config.default_schema(kind).to_string(),
            meta_query: OnceLock::new(),
        }
    }

    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    /// All descriptors, by id.
    pub async fn list_all(&self, db: &Database) -> Result<Vec<Descriptor>, AppError> {
        let q = QueryBuf::raw(format!("{}\n order by e.id", self.meta_query()));
        let mut conn = db.connector().await?;
        let kind = self.kind;
        let all = conn
            .execute_map(&q, |row| read_descriptor(kind, row))?
            .collect_vec()
            .await;
        all
    }

    pub async fn get_by_id(&self, db: &Database, id: i32) -> Result<Option<Descriptor>, AppError> {
        let q = QueryBuf::named(
            &format!("{}\n where e.id = :P_ID", self.meta_query()),
            &[("P_ID", id.into())],
        )?;
        self.fetch_one(db, &q).await
    }

    /// Case-insensitive exact match on `name`.
    pub async fn get_by_name(&self, db: &Database, name: &str) -> Result<Option<Descriptor>, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("descriptor name is required".into()));
        }
        let q = QueryBuf::named(
            &format!("{}\n where lower(e.name) = lower(:P_NAME::text)", self.meta_query()),
            &[("P_NAME", name.into())],
        )?;
        self.fetch_one(db, &q).await
    }

    async fn fetch_one(&self, db: &Database, q: &QueryBuf) -> Result<Option<Descriptor>, AppError> {
        let mut conn = db.connector().await?;
        let kind = self.kind;
        let found = conn.execute_map(q, |row| read_descriptor(kind, row))?.first().await;
        found
    }

    /// Metadata query shared by every lookup; built on first use.
    fn meta_query(&self) -> &str {
        self.meta_query.get_or_init(|| self.build_meta_query())
    }

    fn build_meta_query(&self) -> String {
        let hier_column = match self.kind {
            DescriptorKind::Entity => "",
            DescriptorKind::Dictionary => ",\n       coalesce(e.is_hier, true) as is_hier",
        };
        let meta_table = format!(
            "{}.{}",
            quote_identifier(&self.metadata_schema),
            quote_identifier(self.kind.metadata_table())
        );
        format!(
            r#"{CATALOG_TABLES}
select e.id::int4 as id,
       e.name,
       e.schema_name,
       e.table_name,
       e.description{hier_column},
       t.table_name is not null as is_table_exists
  from {meta_table} as e
  left join tables as t on t.schema_name = lower(coalesce(nullif(trim(e.schema_name), ''), {default_schema}))
                       and t.table_name = lower(trim(e.table_name))"#,
            default_schema = quote_literal(&self.default_schema),
        )
    }
}

fn read_descriptor(kind: DescriptorKind, row: &PgRow) -> Result<Descriptor, AppError> {
    let shape = match kind {
        DescriptorKind::Entity => DescriptorShape::Entity,
        DescriptorKind::Dictionary => DescriptorShape::Dictionary {
            is_hierarchical: row.try_get("is_hier")?,
        },
    };
    Ok(Descriptor {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        schema_name: row.try_get("schema_name")?,
        table_name: row.try_get("table_name")?,
        description: row
            .try_get::<Option<String>, _>("description")?
            .unwrap_or_default(),
        shape,
        is_table_exists: row.try_get("is_table_exists")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(kind: DescriptorKind) -> DescriptorResolver {
        DescriptorResolver::new(kind, &EngineConfig::new("postgres://localhost/test"))
    }

    #[test]
    fn dictionary_query_reads_hier_flag_and_catalog() {
        let r = resolver(DescriptorKind::Dictionary);
        let sql = r.meta_query();
        assert!(sql.starts_with("with tables as ("));
        assert!(sql.contains("from \"meta\".\"dictionary\" as e"));
        assert!(sql.contains("coalesce(e.is_hier, true) as is_hier"));
        assert!(sql.contains("coalesce(nullif(trim(e.schema_name), ''), 'data')"));
        assert!(sql.contains("t.table_name = lower(trim(e.table_name))"));
        assert!(sql.contains("t.table_name is not null as is_table_exists"));
    }

    #[test]
    fn entity_query_has_no_hier_column() {
        let r = resolver(DescriptorKind::Entity);
        let sql = r.meta_query();
        assert!(sql.contains("from \"meta\".\"entity\" as e"));
        assert!(!sql.contains("is_hier"));
    }

    #[test]
    fn query_text_is_memoized() {
        let r = resolver(DescriptorKind::Entity);
        let first = r.meta_query().as_ptr();
        assert_eq!(first, r.meta_query().as_ptr());
    }

    #[test]
    fn name_lookup_binds_the_name() {
        let r = resolver(DescriptorKind::Dictionary);
        let q = QueryBuf::named(
            &format!("{}\n where lower(e.name) = lower(:P_NAME::text)", r.meta_query()),
            &[("P_NAME", "Genres".into())],
        )
        .unwrap();
        assert!(q.sql.ends_with("where lower(e.name) = lower($1::text)"));
        // catalog literals survive placeholder rewriting
        assert!(q.sql.contains("'^pg_'"));
        assert!(q.sql.contains("('r', 'p', 'v', 'm')"));
        assert_eq!(q.params.len(), 1);
    }
}
