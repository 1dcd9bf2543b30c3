//! Dictionary records: named tree nodes with an optional parent, sibling order and
//! an `extra` object.

use crate::db::{Connector, Database, SqlExecutor};
use crate::descriptor::{Descriptor, DescriptorKind, TableRef};
use crate::error::AppError;
use crate::payload::{
    get_optional_int, get_required_string, merge_extra, to_extra, DictionaryLookup, Record, ID, NAME, ORDER,
    PARENT_ID,
};
use crate::service::crud::{delete_row, discard_id, fetch_record, insert_returning_id, RecordStore, StoreContext};
use crate::sql::builder::{self, DictionaryFields};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::Row;

const KIND: DescriptorKind = DescriptorKind::Dictionary;

/// Wire form of a dictionary row: `{id, name, pid, ord, ...extra}`.
fn read_dictionary(row: &PgRow) -> Result<Record, AppError> {
    let mut out = Record::new();
    out.insert(ID.into(), Value::from(row.try_get::<i32, _>("id")?));
    out.insert(NAME.into(), Value::from(row.try_get::<String, _>("name")?));
    out.insert(PARENT_ID.into(), Value::from(row.try_get::<Option<i32>, _>("pid")?));
    out.insert(ORDER.into(), Value::from(row.try_get::<Option<i32>, _>("ord")?));
    merge_extra(row.try_get::<Option<Value>, _>("extra")?, &mut out);
    Ok(out)
}

/// Take the reserved fields out of `payload`; the rest becomes `extra`.
fn split_payload(mut payload: Record) -> Result<DictionaryFields, AppError> {
    discard_id(&mut payload);
    let name = get_required_string(&mut payload, NAME, true)?;
    let pid = get_optional_int(&mut payload, PARENT_ID, true);
    let ord = get_optional_int(&mut payload, ORDER, true);
    Ok(DictionaryFields {
        name,
        pid,
        ord,
        extra: to_extra(payload),
    })
}

#[derive(Clone)]
pub struct DictionaryStore {
    ctx: StoreContext,
}

impl DictionaryStore {
    pub fn new(db: Database) -> Self {
        DictionaryStore {
            ctx: StoreContext::new(db),
        }
    }

    /// Every item of `descriptor` indexed by id, for resolving extension fields that
    /// reference it.
    pub async fn load_lookup(&self, descriptor: &Descriptor) -> Result<DictionaryLookup, AppError> {
        let records = self.list_all(descriptor).await?;
        Ok(DictionaryLookup::from_records(descriptor.name.clone(), records))
    }

    async fn list(conn: &mut Connector, table: &TableRef, hierarchical: bool) -> Result<Vec<Record>, AppError> {
        let q = if hierarchical {
            builder::select_hierarchy(table)
        } else {
            builder::select_flat(table)
        };
        let rows = conn.execute_map(&q, read_dictionary)?.collect_vec().await;
        rows
    }
}

#[async_trait]
impl RecordStore for DictionaryStore {
    fn kind(&self) -> DescriptorKind {
        KIND
    }

    /// Pre-order for hierarchical dictionaries, flat by order then name otherwise.
    async fn list_all(&self, descriptor: &Descriptor) -> Result<Vec<Record>, AppError> {
        let (mut conn, table) = self.ctx.open(descriptor, KIND).await?;
        Self::list(&mut conn, &table, descriptor.is_hierarchical()).await
    }

    async fn get_by_id(&self, descriptor: &Descriptor, id: i32) -> Result<Option<Record>, AppError> {
        let (mut conn, table) = self.ctx.open(descriptor, KIND).await?;
        fetch_record(&mut conn, &builder::select_by_id(KIND, &table, id)?, read_dictionary).await
    }

    async fn insert(&self, descriptor: &Descriptor, payload: Record) -> Result<Record, AppError> {
        let (mut conn, table) = self.ctx.open(descriptor, KIND).await?;
        let fields = split_payload(payload)?;
        let id = insert_returning_id(&mut conn, &builder::insert_dictionary(&table, fields)?).await?;
        fetch_record(&mut conn, &builder::select_by_id(KIND, &table, id)?, read_dictionary)
            .await?
            .ok_or_else(|| AppError::Statement(format!("inserted row {} not readable in {}", id, table)))
    }

    async fn post(&self, descriptor: &Descriptor, payload: Record, id: i32) -> Result<Option<Record>, AppError> {
        let (mut conn, table) = self.ctx.open(descriptor, KIND).await?;
        let fields = split_payload(payload)?;
        let updated = conn
            .execute_non_query(&builder::update_dictionary(&table, id, fields)?)
            .await?;
        if updated == 0 {
            return Ok(None);
        }
        fetch_record(&mut conn, &builder::select_by_id(KIND, &table, id)?, read_dictionary).await
    }

    /// Descendants go with the row through the cascading parent key.
    async fn delete(&self, descriptor: &Descriptor, id: i32) -> Result<bool, AppError> {
        let (mut conn, table) = self.ctx.open(descriptor, KIND).await?;
        delete_row(&mut conn, &table, id).await
    }
}
