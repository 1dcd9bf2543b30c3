//! Metatable SDK: metadata-driven dynamic tables over PostgreSQL. Descriptors name a
//! collection and its backing table; the table is provisioned on first use and served
//! through one generic CRUD protocol for flat entities and tree-shaped dictionaries.

pub mod config;
pub mod db;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod payload;
pub mod provision;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::EngineConfig;
pub use db::{Connector, Database, SqlExecutor};
pub use descriptor::{Descriptor, DescriptorKind, DescriptorResolver, DescriptorShape, TableRef};
pub use engine::Engine;
pub use error::{AppError, ConfigError};
pub use payload::{DictionaryLookup, Record};
pub use provision::SchemaProvisioner;
pub use response::{success_many, success_one};
pub use routes::{common_routes, common_routes_with_ready, record_routes};
pub use service::{DictionaryStore, EntityStore, RecordStore};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_metadata_tables};
