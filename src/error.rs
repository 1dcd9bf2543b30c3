//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("key not found: {0}")]
    MissingKey(String),
    #[error("key {key} has wrong type: {found}")]
    TypeMismatch { key: String, found: &'static str },
    #[error("key {key} not found in lookup {lookup}")]
    LookupKeyNotFound { key: i32, lookup: String },
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("descriptor kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("statement: {0}")]
    Statement(String),
    #[error("connection is not open")]
    ConnectionClosed,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AppError {
    /// HTTP status and stable error code for this error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::MissingKey(_) | AppError::TypeMismatch { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_payload")
            }
            AppError::LookupKeyNotFound { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "lookup_not_found"),
            AppError::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, "invalid_identifier"),
            AppError::KindMismatch { .. } => (StatusCode::BAD_REQUEST, "kind_mismatch"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Statement(_) | AppError::ConnectionClosed => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            AppError::Db(e) => match e {
                sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "not_found"),
                sqlx::Error::Database(db)
                    if db.is_unique_violation() || db.is_foreign_key_violation() =>
                {
                    (StatusCode::CONFLICT, "conflict")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_errors_map_to_unprocessable() {
        let e = AppError::TypeMismatch {
            key: "name".into(),
            found: "number",
        };
        assert_eq!(e.status(), (StatusCode::UNPROCESSABLE_ENTITY, "invalid_payload"));
        assert_eq!(e.to_string(), "key name has wrong type: number");

        let e = AppError::MissingKey("name".into());
        assert_eq!(e.status().0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn lookup_miss_names_key_and_lookup() {
        let e = AppError::LookupKeyNotFound {
            key: 42,
            lookup: "genres".into(),
        };
        assert_eq!(e.to_string(), "key 42 not found in lookup genres");
        assert_eq!(e.status().1, "lookup_not_found");
    }

    #[test]
    fn row_not_found_is_404() {
        let e = AppError::Db(sqlx::Error::RowNotFound);
        assert_eq!(e.status().0, StatusCode::NOT_FOUND);
        assert_eq!(AppError::NotFound("x".into()).status().0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn config_error_is_transparent() {
        let e: AppError = ConfigError::MissingVar("DATABASE_URL").into();
        assert_eq!(e.to_string(), "missing environment variable: DATABASE_URL");
        assert_eq!(e.status().0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
