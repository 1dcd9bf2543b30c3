//! Statement execution primitives shared by connectors and transactions.

use crate::db::cursor::{MappedRows, RowCursor};
use crate::error::AppError;
use crate::sql::QueryBuf;
use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgRow, Postgres};
use sqlx::{Decode, Row, Type, ValueRef};

/// Anything holding an open connection that statements can run on.
#[async_trait]
pub trait SqlExecutor: Send {
    /// The open connection, or `AppError::ConnectionClosed`.
    fn connection(&mut self) -> Result<&mut PgConnection, AppError>;

    /// Run a statement; returns rows affected.
    async fn execute_non_query(&mut self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let conn = self.connection()?;
        let result = q.to_query().execute(conn).await?;
        Ok(result.rows_affected())
    }

    /// First column of the first row; `T::default()` when it is SQL NULL or there is no row.
    async fn execute_scalar<T>(&mut self, q: &QueryBuf) -> Result<T, AppError>
    where
        T: for<'r> Decode<'r, Postgres> + Type<Postgres> + Default + Send + Unpin + 'static,
    {
        tracing::debug!(sql = %q.sql, params = ?q.params, "scalar");
        let conn = self.connection()?;
        let mut query = sqlx::query_scalar::<Postgres, Option<T>>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let value = query.fetch_optional(conn).await?;
        Ok(value.flatten().unwrap_or_default())
    }

    /// Open a cursor over the result set. See [`RowCursor`] for lifetime rules.
    fn execute_reader<'a>(&'a mut self, q: &'a QueryBuf) -> Result<RowCursor<'a>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "reader");
        let conn = self.connection()?;
        Ok(RowCursor::new(q.to_query().fetch(conn)))
    }

    /// Call `each` for every row, in order; returns the number of rows seen.
    async fn execute_reader_each<F>(&mut self, q: &QueryBuf, mut each: F) -> Result<u64, AppError>
    where
        F: FnMut(&PgRow) -> Result<(), AppError> + Send,
    {
        let mut cursor = self.execute_reader(q)?;
        let mut count = 0u64;
        while let Some(row) = cursor.next_row().await? {
            each(&row)?;
            count += 1;
        }
        Ok(count)
    }

    /// Lazy sequence of `map(row)`, one per row.
    fn execute_map<'a, T, F>(&'a mut self, q: &'a QueryBuf, map: F) -> Result<MappedRows<'a, F>, AppError>
    where
        F: FnMut(&PgRow) -> Result<T, AppError>,
    {
        Ok(self.execute_reader(q)?.map_rows(map))
    }

    /// True when the statement yields a row whose first column is not NULL.
    async fn exists(&mut self, q: &QueryBuf) -> Result<bool, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "exists");
        let conn = self.connection()?;
        let row = q.to_query().fetch_optional(conn).await?;
        match row {
            Some(row) => Ok(!row.try_get_raw(0)?.is_null()),
            None => Ok(false),
        }
    }
}
