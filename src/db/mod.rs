//! Connection/execution core: pool handle, connectors, transactions, cursors.

mod connector;
mod cursor;
mod executor;

pub use connector::{Connector, TxScope};
pub use cursor::{MappedRows, RowCursor};
pub use executor::SqlExecutor;

use crate::config::{validate, EngineConfig};
use crate::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Pool handle passed through call context. Cloning shares the pool, the config and the
/// default connector.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    config: Arc<EngineConfig>,
    default_connector: Arc<Mutex<Connector>>,
}

impl Database {
    /// Connect a pool sized from `config`.
    pub async fn connect(config: EngineConfig) -> Result<Self, AppError> {
        let config = validate(config)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        Self::from_pool(pool, config)
    }

    /// Wrap an existing pool. The config is validated and its schema names lower-cased.
    pub fn from_pool(pool: PgPool, config: EngineConfig) -> Result<Self, AppError> {
        let config = validate(config)?;
        let default_connector = Connector::new(pool.clone());
        Ok(Database {
            pool,
            config: Arc::new(config),
            default_connector: Arc::new(Mutex::new(default_connector)),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A private, open connector for one call.
    pub async fn connector(&self) -> Result<Connector, AppError> {
        let mut conn = Connector::new(self.pool.clone());
        conn.open().await?;
        Ok(conn)
    }

    /// The shared connector, locked for the caller. Reopened when it was closed or no
    /// longer answers.
    pub async fn default_connector(&self) -> Result<MutexGuard<'_, Connector>, AppError> {
        let mut guard = self.default_connector.lock().await;
        if !guard.is_open() {
            guard.open().await?;
        } else if !guard.is_healthy().await {
            tracing::warn!("default connection broken, reopening");
            guard.open().await?;
        }
        Ok(guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@127.0.0.1:1/none")
            .expect("lazy pool")
    }

    #[tokio::test]
    async fn wrapped_config_is_normalized() {
        let config = EngineConfig::new("postgres://postgres@127.0.0.1:1/none")
            .with_metadata_schema("Meta")
            .with_data_schema(" Data ");
        let db = Database::from_pool(lazy_pool(), config).unwrap();
        assert_eq!(db.config().metadata_schema, "meta");
        assert_eq!(db.config().data_schema, "data");
    }

    #[tokio::test]
    async fn wrapped_config_is_validated() {
        let config = EngineConfig::new("postgres://postgres@127.0.0.1:1/none")
            .with_metadata_schema("meta\"; drop");
        assert!(matches!(
            Database::from_pool(lazy_pool(), config),
            Err(AppError::Config(ConfigError::InvalidValue { .. }))
        ));
    }
}
