//! Shared setup for database tests. Each harness gets its own metadata and data schemas;
//! tests return early when `METATABLE_TEST_DATABASE_URL` is unset (a `.env` file is honoured).

#![allow(dead_code)]

use metatable_sdk::{ensure_metadata_tables, Database, DescriptorKind, Engine, EngineConfig, Record};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const TEST_DATABASE_URL_VAR: &str = "METATABLE_TEST_DATABASE_URL";

static COUNTER: AtomicUsize = AtomicUsize::new(0);

pub struct Harness {
    pub engine: Engine,
    pub meta_schema: String,
    pub data_schema: String,
}

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    format!(
        "{}_{}_{}",
        std::process::id(),
        nanos,
        COUNTER.fetch_add(1, Ordering::SeqCst)
    )
}

pub async fn setup() -> Option<Harness> {
    setup_with(|config| config).await
}

/// Like `setup`, with a chance to adjust the config (pool size, schema spelling).
pub async fn setup_with(adjust: impl FnOnce(EngineConfig) -> EngineConfig) -> Option<Harness> {
    dotenvy::dotenv().ok();
    let url = std::env::var(TEST_DATABASE_URL_VAR).ok()?;
    let suffix = unique_suffix();
    let meta_schema = format!("mt_meta_{}", suffix);
    let data_schema = format!("mt_data_{}", suffix);
    let config = adjust(
        EngineConfig::new(url)
            .with_metadata_schema(meta_schema.clone())
            .with_data_schema(data_schema.clone()),
    );
    let db = Database::connect(config).await.expect("connect test database");
    ensure_metadata_tables(&db).await.expect("metadata tables");
    Some(Harness {
        engine: Engine::new(db),
        meta_schema,
        data_schema,
    })
}

impl Harness {
    /// Insert a descriptor row; returns its id.
    pub async fn register(&self, kind: DescriptorKind, name: &str, table: &str, description: &str) -> i32 {
        let sql = format!(
            "insert into \"{}\".\"{}\" (name, table_name, description) values ($1, $2, $3) returning id",
            self.meta_schema,
            kind.metadata_table()
        );
        sqlx::query_scalar(&sql)
            .bind(name)
            .bind(table)
            .bind(description)
            .fetch_one(self.engine.database().pool())
            .await
            .expect("register descriptor")
    }

    pub async fn set_hierarchical(&self, name: &str, is_hier: bool) {
        let sql = format!(
            "update \"{}\".\"dictionary\" set is_hier = $1 where name = $2",
            self.meta_schema
        );
        sqlx::query(&sql)
            .bind(is_hier)
            .bind(name)
            .execute(self.engine.database().pool())
            .await
            .expect("update is_hier");
    }

    pub async fn table_count(&self, table: &str) -> i64 {
        sqlx::query_scalar(
            "select count(*) from pg_catalog.pg_tables where schemaname = $1 and tablename = $2",
        )
        .bind(&self.data_schema)
        .bind(table)
        .fetch_one(self.engine.database().pool())
        .await
        .expect("catalog count")
    }

    pub async fn cleanup(self) {
        let pool = self.engine.database().pool();
        for schema in [&self.data_schema, &self.meta_schema] {
            let _ = sqlx::query(&format!("drop schema if exists \"{}\" cascade", schema))
                .execute(pool)
                .await;
        }
    }
}

pub fn record(v: Value) -> Record {
    match v {
        Value::Object(m) => m,
        other => panic!("not an object: {}", other),
    }
}

pub fn names(records: &[Record]) -> Vec<&str> {
    records
        .iter()
        .map(|r| r["name"].as_str().unwrap_or_default())
        .collect()
}
