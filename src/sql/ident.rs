//! Identifier validation and quoting. The only place where names are spliced into SQL text.

use crate::error::AppError;
use regex::Regex;
use std::sync::OnceLock;

/// PostgreSQL truncates identifiers longer than this.
pub const MAX_IDENTIFIER_LEN: usize = 63;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"))
}

/// True when `name` is a plain identifier that needs no escaping.
pub fn is_valid_identifier(name: &str) -> bool {
    name.len() <= MAX_IDENTIFIER_LEN && identifier_re().is_match(name)
}

/// Reject anything but a plain identifier.
pub fn validate_identifier(name: &str) -> Result<(), AppError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(AppError::InvalidIdentifier(name.to_string()))
    }
}

/// Quote identifier for PostgreSQL.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal. Only for DDL text such as `COMMENT ON ... IS`, where
/// parameters cannot be bound.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(is_valid_identifier("genres"));
        assert!(is_valid_identifier("_movie_2"));
        assert!(validate_identifier("Data").is_ok());
    }

    #[test]
    fn rejects_everything_else() {
        for bad in ["", "1abc", "a-b", "a b", "x\"y", "drop table;", "schema.table"] {
            assert!(
                matches!(validate_identifier(bad), Err(AppError::InvalidIdentifier(_))),
                "{bad} should be rejected"
            );
        }
        assert!(!is_valid_identifier(&"a".repeat(64)));
        assert!(is_valid_identifier(&"a".repeat(63)));
    }

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(quote_identifier("genres"), "\"genres\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_literal("Fan's list"), "'Fan''s list'");
        assert_eq!(quote_literal(""), "''");
    }
}
