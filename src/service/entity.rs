//! Entity records: `id` plus an opaque `extra` object.

use crate::db::{Database, SqlExecutor};
use crate::descriptor::{Descriptor, DescriptorKind};
use crate::error::AppError;
use crate::payload::{merge_extra, to_extra, Record, ID};
use crate::service::crud::{delete_row, discard_id, fetch_record, insert_returning_id, RecordStore, StoreContext};
use crate::sql::builder;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::Row;

const KIND: DescriptorKind = DescriptorKind::Entity;

/// Wire form of an entity row: `{id, ...extra}`.
fn read_entity(row: &PgRow) -> Result<Record, AppError> {
    let mut out = Record::new();
    out.insert(ID.into(), Value::from(row.try_get::<i32, _>("id")?));
    merge_extra(row.try_get::<Option<Value>, _>("extra")?, &mut out);
    Ok(out)
}

#[derive(Clone)]
pub struct EntityStore {
    ctx: StoreContext,
}

impl EntityStore {
    pub fn new(db: Database) -> Self {
        EntityStore {
            ctx: StoreContext::new(db),
        }
    }
}

#[async_trait]
impl RecordStore for EntityStore {
    fn kind(&self) -> DescriptorKind {
        KIND
    }

    async fn list_all(&self, descriptor: &Descriptor) -> Result<Vec<Record>, AppError> {
        let (mut conn, table) = self.ctx.open(descriptor, KIND).await?;
        let q = builder::select_all(KIND, &table);
        let mut out = Vec::new();
        conn.execute_reader_each(&q, |row| {
            out.push(read_entity(row)?);
            Ok(())
        })
        .await?;
        Ok(out)
    }

    async fn get_by_id(&self, descriptor: &Descriptor, id: i32) -> Result<Option<Record>, AppError> {
        let (mut conn, table) = self.ctx.open(descriptor, KIND).await?;
        let q = builder::select_by_id(KIND, &table, id)?;
        fetch_record(&mut conn, &q, read_entity).await
    }

    async fn insert(&self, descriptor: &Descriptor, mut payload: Record) -> Result<Record, AppError> {
        let (mut conn, table) = self.ctx.open(descriptor, KIND).await?;
        discard_id(&mut payload);
        let id = insert_returning_id(&mut conn, &builder::insert_entity(&table, to_extra(payload))?).await?;
        fetch_record(&mut conn, &builder::select_by_id(KIND, &table, id)?, read_entity)
            .await?
            .ok_or_else(|| AppError::Statement(format!("inserted row {} not readable in {}", id, table)))
    }

    async fn post(&self, descriptor: &Descriptor, mut payload: Record, id: i32) -> Result<Option<Record>, AppError> {
        let (mut conn, table) = self.ctx.open(descriptor, KIND).await?;
        discard_id(&mut payload);
        let updated = conn
            .execute_non_query(&builder::update_entity(&table, id, to_extra(payload))?)
            .await?;
        if updated == 0 {
            return Ok(None);
        }
        fetch_record(&mut conn, &builder::select_by_id(KIND, &table, id)?, read_entity).await
    }

    async fn delete(&self, descriptor: &Descriptor, id: i32) -> Result<bool, AppError> {
        let (mut conn, table) = self.ctx.open(descriptor, KIND).await?;
        delete_row(&mut conn, &table, id).await
    }
}
