//! Config validation: schema names must be plain identifiers.

use crate::config::{EngineConfig, DATA_SCHEMA_VAR, METADATA_SCHEMA_VAR, MAX_CONNECTIONS_VAR};
use crate::error::ConfigError;
use crate::sql::is_valid_identifier;

/// Normalize (lower-case schema names) and check a config.
pub fn validate(mut config: EngineConfig) -> Result<EngineConfig, ConfigError> {
    config.metadata_schema = config.metadata_schema.trim().to_lowercase();
    config.data_schema = config.data_schema.trim().to_lowercase();

    for (key, value) in [
        (METADATA_SCHEMA_VAR, &config.metadata_schema),
        (DATA_SCHEMA_VAR, &config.data_schema),
    ] {
        if !is_valid_identifier(value) {
            return Err(ConfigError::InvalidValue {
                key,
                message: format!("'{}' is not a valid schema name", value),
            });
        }
    }
    if config.max_connections == 0 {
        return Err(ConfigError::InvalidValue {
            key: MAX_CONNECTIONS_VAR,
            message: "must be at least 1".into(),
        });
    }
    Ok(config)
}
