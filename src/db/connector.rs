//! One exclusive database connection and its transaction scope.

use crate::db::executor::SqlExecutor;
use crate::error::AppError;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnection, PgPool, Postgres};
use sqlx::{Connection, Transaction};

/// Holds at most one connection checked out of the pool. Dropping the connector (or
/// calling [`Connector::close`]) hands the connection back.
pub struct Connector {
    pool: PgPool,
    conn: Option<PoolConnection<Postgres>>,
}

impl Connector {
    /// A closed connector; call [`Connector::open`] before use.
    pub fn new(pool: PgPool) -> Self {
        Connector { pool, conn: None }
    }

    /// Open a fresh connection, releasing the current one first.
    pub async fn open(&mut self) -> Result<(), AppError> {
        self.close();
        self.conn = Some(self.pool.acquire().await?);
        Ok(())
    }

    pub fn close(&mut self) {
        self.conn = None;
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// True when open and the server answers a ping.
    pub async fn is_healthy(&mut self) -> bool {
        match self.conn.as_mut() {
            Some(conn) => conn.ping().await.is_ok(),
            None => false,
        }
    }

    /// Start a transaction. Changes are kept only if [`TxScope::commit`] is called;
    /// dropping the scope rolls back.
    pub async fn begin_transaction(&mut self) -> Result<TxScope<'_>, AppError> {
        let conn: &mut PgConnection = self.connection()?;
        let tx = conn.begin().await?;
        tracing::debug!("transaction started");
        Ok(TxScope { tx })
    }
}

impl SqlExecutor for Connector {
    fn connection(&mut self) -> Result<&mut PgConnection, AppError> {
        self.conn
            .as_deref_mut()
            .ok_or(AppError::ConnectionClosed)
    }
}

/// Open transaction on a connector's connection.
pub struct TxScope<'c> {
    tx: Transaction<'c, Postgres>,
}

impl TxScope<'_> {
    pub async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        tracing::debug!("transaction committed");
        Ok(())
    }

    /// Explicit rollback; equivalent to dropping the scope.
    pub async fn rollback(self) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

impl SqlExecutor for TxScope<'_> {
    fn connection(&mut self) -> Result<&mut PgConnection, AppError> {
        Ok(&mut *self.tx)
    }
}
