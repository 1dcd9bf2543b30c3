//! Load engine configuration from the process environment.

use crate::config::{validate, EngineConfig, DEFAULT_MAX_CONNECTIONS};
use crate::error::ConfigError;

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const METADATA_SCHEMA_VAR: &str = "METATABLE_METADATA_SCHEMA";
pub const DATA_SCHEMA_VAR: &str = "METATABLE_DATA_SCHEMA";
pub const MAX_CONNECTIONS_VAR: &str = "METATABLE_MAX_CONNECTIONS";

impl EngineConfig {
    /// Read configuration from the process environment and validate it.
    pub fn from_env() -> Result<Self, ConfigError> {
        from_lookup(|key| std::env::var(key).ok())
    }
}

/// Build a validated config from any key lookup; `from_env` passes the process environment.
pub fn from_lookup<F>(lookup: F) -> Result<EngineConfig, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let database_url = lookup(DATABASE_URL_VAR)
        .filter(|s| !s.trim().is_empty())
        .ok_or(ConfigError::MissingVar(DATABASE_URL_VAR))?;
    let mut config = EngineConfig::new(database_url);
    if let Some(s) = lookup(METADATA_SCHEMA_VAR).filter(|s| !s.trim().is_empty()) {
        config.metadata_schema = s;
    }
    if let Some(s) = lookup(DATA_SCHEMA_VAR).filter(|s| !s.trim().is_empty()) {
        config.data_schema = s;
    }
    config.max_connections = match lookup(MAX_CONNECTIONS_VAR) {
        Some(s) => s.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: MAX_CONNECTIONS_VAR,
            message: format!("'{}' is not a number", s),
        })?,
        None => DEFAULT_MAX_CONNECTIONS,
    };
    validate(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_only_url_is_set() {
        let c = from_lookup(lookup_in(&[(DATABASE_URL_VAR, "postgres://localhost/app")])).unwrap();
        assert_eq!(c.database_url, "postgres://localhost/app");
        assert_eq!(c.metadata_schema, "meta");
        assert_eq!(c.data_schema, "data");
        assert_eq!(c.max_connections, 5);
    }

    #[test]
    fn overrides_are_lowercased() {
        let c = from_lookup(lookup_in(&[
            (DATABASE_URL_VAR, "postgres://localhost/app"),
            (METADATA_SCHEMA_VAR, "Catalog"),
            (DATA_SCHEMA_VAR, "Store"),
            (MAX_CONNECTIONS_VAR, "12"),
        ]))
        .unwrap();
        assert_eq!(c.metadata_schema, "catalog");
        assert_eq!(c.data_schema, "store");
        assert_eq!(c.max_connections, 12);
    }

    #[test]
    fn missing_url_is_an_error() {
        assert!(matches!(
            from_lookup(lookup_in(&[])),
            Err(ConfigError::MissingVar(DATABASE_URL_VAR))
        ));
    }

    #[test]
    fn bad_connection_limit_is_an_error() {
        let err = from_lookup(lookup_in(&[
            (DATABASE_URL_VAR, "postgres://localhost/app"),
            (MAX_CONNECTIONS_VAR, "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: MAX_CONNECTIONS_VAR, .. }));
    }
}
