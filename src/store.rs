//! Database and metadata bootstrap. Metadata rows themselves are maintained elsewhere;
//! this only makes sure the database and the two descriptor tables exist.

use crate::db::{Database, SqlExecutor};
use crate::descriptor::DescriptorKind;
use crate::error::AppError;
use crate::sql::{quote_identifier, validate_identifier, QueryBuf};
use sqlx::ConnectOptions;
use std::str::FromStr;

fn metadata_table_ddl(schema: &str, kind: DescriptorKind) -> Vec<String> {
    let table = kind.metadata_table();
    let full = format!("{}.{}", quote_identifier(schema), quote_identifier(table));
    let hier_column = match kind {
        DescriptorKind::Entity => "",
        DescriptorKind::Dictionary => ",\n  is_hier boolean NULL DEFAULT true",
    };
    vec![
        format!(
            r#"CREATE TABLE IF NOT EXISTS {full}
(
  id int4 NOT NULL GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
  name text NOT NULL,
  schema_name text NULL,
  table_name text NOT NULL,
  description text NULL{hier_column}
)"#
        ),
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {}(lower(name))",
            quote_identifier(&format!("{}_name_uidx", table)),
            full
        ),
    ]
}

/// Create the metadata schema and the `entity` and `dictionary` descriptor tables if
/// missing. Descriptor names are unique ignoring case.
pub async fn ensure_metadata_tables(db: &Database) -> Result<(), AppError> {
    let schema = db.config().metadata_schema.as_str();
    validate_identifier(schema)?;
    let mut conn = db.connector().await?;
    let mut tx = conn.begin_transaction().await?;
    tx.execute_non_query(&QueryBuf::raw(format!(
        "CREATE SCHEMA IF NOT EXISTS {}",
        quote_identifier(schema)
    )))
    .await?;
    for kind in [DescriptorKind::Entity, DescriptorKind::Dictionary] {
        for stmt in metadata_table_ddl(schema, kind) {
            tx.execute_non_query(&QueryBuf::raw(stmt)).await?;
        }
    }
    tx.commit().await?;
    tracing::info!(schema = %schema, "metadata tables ready");
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_identifier(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Split a connection URL into the same server's `postgres` database URL and the
/// database name. Query parameters are kept on the admin URL.
fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let (base_and_path, query) = match url.split_once('?') {
        Some((b, q)) => (b, Some(q)),
        None => (url, None),
    };
    let path_start = base_and_path
        .rfind('/')
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))?
        + 1;
    let db_name = base_and_path[path_start..].trim().to_string();
    let mut admin_url = format!("{}postgres", &base_and_path[..path_start]);
    if let Some(q) = query {
        admin_url.push('?');
        admin_url.push_str(q);
    }
    Ok((admin_url, db_name))
}
