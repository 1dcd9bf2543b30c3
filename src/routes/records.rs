//! Descriptor and record routes. `:kind` is `entity` or `dictionary`; `:name` is the
//! descriptor name, matched case-insensitively.

use crate::handlers::records::{
    delete_record, list_descriptors, list_records, post_record, put_record, read_record,
};
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn record_routes(state: AppState) -> Router {
    Router::new()
        .route("/:kind", get(list_descriptors))
        .route("/:kind/:name", get(list_records).put(put_record))
        .route(
            "/:kind/:name/:id",
            get(read_record).post(post_record).delete(delete_record),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
