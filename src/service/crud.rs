//! Generic CRUD protocol over provisioned data tables.

use crate::db::{Connector, Database, SqlExecutor};
use crate::descriptor::{Descriptor, DescriptorKind, TableRef};
use crate::error::AppError;
use crate::payload::{get_optional_id, Record, ID};
use crate::provision::SchemaProvisioner;
use crate::sql::{builder, QueryBuf};
use async_trait::async_trait;
use sqlx::postgres::PgRow;

/// List/get/put/post/delete for one record kind. Every operation takes the descriptor it
/// runs against and fails with `AppError::KindMismatch` for a descriptor of another kind.
/// The backing table is provisioned on first use.
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn kind(&self) -> DescriptorKind;

    async fn list_all(&self, descriptor: &Descriptor) -> Result<Vec<Record>, AppError>;

    async fn get_by_id(&self, descriptor: &Descriptor, id: i32) -> Result<Option<Record>, AppError>;

    /// Insert a new row with a generated id; any `id` in the payload is ignored.
    /// Returns the row as stored.
    async fn insert(&self, descriptor: &Descriptor, payload: Record) -> Result<Record, AppError>;

    /// Update when the payload carries an integer `id`, insert otherwise.
    /// `None` only when the update targets a row that does not exist.
    async fn put(&self, descriptor: &Descriptor, mut payload: Record) -> Result<Option<Record>, AppError> {
        match get_optional_id(&mut payload, true) {
            Some(id) => self.post(descriptor, payload, id).await,
            None => self.insert(descriptor, payload).await.map(Some),
        }
    }

    /// Replace the mutable fields of row `id`; an `id` inside the payload is discarded.
    /// Returns the row re-read after the write, or `None` when no such row exists.
    async fn post(&self, descriptor: &Descriptor, payload: Record, id: i32) -> Result<Option<Record>, AppError>;

    /// Delete row `id`. True when a row was removed.
    async fn delete(&self, descriptor: &Descriptor, id: i32) -> Result<bool, AppError>;
}

/// Connection and provisioning plumbing shared by the stores.
#[derive(Clone)]
pub(crate) struct StoreContext {
    pub(crate) db: Database,
    pub(crate) provisioner: SchemaProvisioner,
}

impl StoreContext {
    pub(crate) fn new(db: Database) -> Self {
        let provisioner = SchemaProvisioner::new(db.config());
        StoreContext { db, provisioner }
    }

    /// Check the kind and table name, open a private connector and make sure the table exists.
    pub(crate) async fn open(
        &self,
        descriptor: &Descriptor,
        kind: DescriptorKind,
    ) -> Result<(Connector, TableRef), AppError> {
        descriptor.expect_kind(kind)?;
        self.provisioner.table_ref(descriptor)?;
        let mut conn = self.db.connector().await?;
        let table = self.provisioner.ensure_table(&mut conn, descriptor).await?;
        Ok((conn, table))
    }
}

/// Run a statement returning one row and map it.
pub(crate) async fn fetch_record<F>(
    conn: &mut Connector,
    q: &QueryBuf,
    read: F,
) -> Result<Option<Record>, AppError>
where
    F: FnMut(&PgRow) -> Result<Record, AppError> + Send,
{
    let found = conn.execute_map(q, read)?.first().await;
    found
}

/// Insert and return the generated id.
pub(crate) async fn insert_returning_id(conn: &mut Connector, q: &QueryBuf) -> Result<i32, AppError> {
    let id: i32 = conn.execute_scalar(q).await?;
    if id == 0 {
        return Err(AppError::Statement("insert returned no id".into()));
    }
    Ok(id)
}

pub(crate) async fn delete_row(conn: &mut Connector, table: &TableRef, id: i32) -> Result<bool, AppError> {
    let removed = conn.execute_non_query(&builder::delete(table, id)?).await?;
    Ok(removed > 0)
}

/// Drop a payload's own `id`; the path or generated id is authoritative.
pub(crate) fn discard_id(payload: &mut Record) {
    payload.shift_remove(ID);
}
