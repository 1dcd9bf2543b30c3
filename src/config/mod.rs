//! Engine configuration: connection string and schema names.

mod loader;
mod validator;

pub use loader::*;
pub use validator::*;

use crate::descriptor::DescriptorKind;

pub const DEFAULT_METADATA_SCHEMA: &str = "meta";
pub const DEFAULT_DATA_SCHEMA: &str = "data";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub database_url: String,
    /// Schema holding the `entity` and `dictionary` metadata tables.
    pub metadata_schema: String,
    /// Schema for data tables whose descriptor leaves `schema_name` blank.
    pub data_schema: String,
    pub max_connections: u32,
}

impl EngineConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        EngineConfig {
            database_url: database_url.into(),
            metadata_schema: DEFAULT_METADATA_SCHEMA.into(),
            data_schema: DEFAULT_DATA_SCHEMA.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    pub fn with_metadata_schema(mut self, schema: impl Into<String>) -> Self {
        self.metadata_schema = schema.into();
        self
    }

    pub fn with_data_schema(mut self, schema: impl Into<String>) -> Self {
        self.data_schema = schema.into();
        self
    }

    pub fn with_max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    /// Schema used for a descriptor of `kind` with no schema of its own.
    pub fn default_schema(&self, _kind: DescriptorKind) -> &str {
        &self.data_schema
    }
}
