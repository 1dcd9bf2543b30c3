//! Single-pass row cursors bound to the connection that issued them.

use crate::error::AppError;
use futures_util::stream::BoxStream;
use futures_util::TryStreamExt;
use sqlx::postgres::PgRow;

/// Open result set. Rows are pulled on demand from the server; the cursor borrows its
/// connection mutably, so it cannot outlive the scope that owns the connection and
/// nothing else can run on that connection until the cursor is dropped. It cannot be
/// rewound.
pub struct RowCursor<'c> {
    stream: BoxStream<'c, Result<PgRow, sqlx::Error>>,
}

impl<'c> RowCursor<'c> {
    pub(crate) fn new(stream: BoxStream<'c, Result<PgRow, sqlx::Error>>) -> Self {
        RowCursor { stream }
    }

    /// Next row, or `None` once the result set is exhausted.
    pub async fn next_row(&mut self) -> Result<Option<PgRow>, AppError> {
        Ok(self.stream.try_next().await?)
    }

    /// Lazily transform each row.
    pub fn map_rows<T, F>(self, map: F) -> MappedRows<'c, F>
    where
        F: FnMut(&PgRow) -> Result<T, AppError>,
    {
        MappedRows { cursor: self, map }
    }
}

/// Lazy sequence producing one value per row. Same lifetime rules as [`RowCursor`];
/// consume it fully (or drop it) before releasing the connection.
pub struct MappedRows<'c, F> {
    cursor: RowCursor<'c>,
    map: F,
}

impl<'c, F> MappedRows<'c, F> {
    pub async fn next<T>(&mut self) -> Result<Option<T>, AppError>
    where
        F: FnMut(&PgRow) -> Result<T, AppError>,
    {
        match self.cursor.next_row().await? {
            Some(row) => Ok(Some((self.map)(&row)?)),
            None => Ok(None),
        }
    }

    /// Drain the remaining rows.
    pub async fn collect_vec<T>(mut self) -> Result<Vec<T>, AppError>
    where
        F: FnMut(&PgRow) -> Result<T, AppError>,
    {
        let mut out = Vec::new();
        while let Some(item) = self.next().await? {
            out.push(item);
        }
        Ok(out)
    }

    /// First value, discarding the rest of the result set.
    pub async fn first<T>(mut self) -> Result<Option<T>, AppError>
    where
        F: FnMut(&PgRow) -> Result<T, AppError>,
    {
        self.next().await
    }
}
