//! Routers: common (health, readiness, version) and record CRUD.

mod common;
mod records;

pub use common::{common_routes, common_routes_with_ready};
pub use records::{record_routes, MAX_BODY_BYTES};
