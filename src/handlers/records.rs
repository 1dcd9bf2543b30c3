//! Descriptor and record handlers: list, read, put, post, delete.

use crate::descriptor::{Descriptor, DescriptorKind};
use crate::error::AppError;
use crate::payload::Record;
use crate::response::{success_many, success_one};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

fn parse_kind(kind: &str) -> Result<DescriptorKind, AppError> {
    kind.parse()
}

fn parse_id(id_str: &str) -> Result<i32, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadRequest("invalid id".into()))
}

fn body_to_record(value: Value) -> Result<Record, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

async fn descriptor(state: &AppState, kind: DescriptorKind, name: &str) -> Result<Descriptor, AppError> {
    state
        .engine
        .resolve(kind, name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} '{}'", kind, name)))
}

fn record_not_found(d: &Descriptor, id: i32) -> AppError {
    AppError::NotFound(format!("{} record {}", d.name, id))
}

pub async fn list_descriptors(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let rows = state.engine.descriptors(kind).await?;
    Ok(success_many(rows))
}

pub async fn list_records(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let d = descriptor(&state, kind, &name).await?;
    let rows = state.engine.store(kind).list_all(&d).await?;
    Ok(success_many(rows))
}

pub async fn read_record(
    State(state): State<AppState>,
    Path((kind, name, id_str)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id_str)?;
    let d = descriptor(&state, kind, &name).await?;
    let row = state
        .engine
        .store(kind)
        .get_by_id(&d, id)
        .await?
        .ok_or_else(|| record_not_found(&d, id))?;
    Ok(success_one(row))
}

/// Update when the body carries an `id`, insert otherwise.
pub async fn put_record(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let body = body_to_record(body)?;
    let d = descriptor(&state, kind, &name).await?;
    let row = state
        .engine
        .store(kind)
        .put(&d, body)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} record", d.name)))?;
    Ok(success_one(row))
}

pub async fn post_record(
    State(state): State<AppState>,
    Path((kind, name, id_str)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id_str)?;
    let body = body_to_record(body)?;
    let d = descriptor(&state, kind, &name).await?;
    let row = state
        .engine
        .store(kind)
        .post(&d, body, id)
        .await?
        .ok_or_else(|| record_not_found(&d, id))?;
    Ok(success_one(row))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path((kind, name, id_str)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id_str)?;
    let d = descriptor(&state, kind, &name).await?;
    if !state.engine.store(kind).delete(&d, id).await? {
        return Err(record_not_found(&d, id));
    }
    Ok(StatusCode::NO_CONTENT)
}
