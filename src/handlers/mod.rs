//! HTTP handlers for descriptor listing and record CRUD.

pub mod records;
pub use records::*;
