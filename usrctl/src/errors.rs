use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data, rejected before touching the store
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UnresolvedReference { .. } | DbError::NoFieldsToUpdate => StatusCode::BAD_REQUEST,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } | DbError::InvalidData { .. } => {
                    StatusCode::BAD_REQUEST
                }
                DbError::Unavailable(_) | DbError::TimedOut { .. } => StatusCode::SERVICE_UNAVAILABLE,
                DbError::InsertFailed { .. }
                | DbError::CredentialPreparation { .. }
                | DbError::CommitFailed(_)
                | DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UnresolvedReference { .. } | DbError::NoFieldsToUpdate => db_err.to_string(),
                DbError::UniqueViolation { constraint, .. } => match constraint.as_deref() {
                    Some(c) if c.contains("username") => "This username is already taken".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } | DbError::InvalidData { .. } => "Invalid data provided".to_string(),
                DbError::Unavailable(_) | DbError::TimedOut { .. } => "Service temporarily unavailable".to_string(),
                DbError::CommitFailed(_) => "The request could not be confirmed; verify its outcome before retrying".to_string(),
                DbError::InsertFailed { .. } | DbError::CredentialPreparation { .. } | DbError::Other(_) => {
                    "Database error occurred".to_string()
                }
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::CommitFailed(_)) => {
                tracing::error!("Commit failed, outcome indeterminate: {:#}", self);
            }
            Error::Database(db_err) if db_err.is_client_fault() => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Database(DbError::NotFound) | Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Database(DbError::Unavailable(_) | DbError::TimedOut { .. }) => {
                tracing::warn!("Store unavailable: {}", self);
            }
            Error::Database(_) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
        }

        let status = self.status_code();

        match &self {
            // Unique violations get a small structured body naming the clashing resource
            Error::Database(DbError::UniqueViolation { table, .. }) => {
                let body = json!({
                    "message": self.user_message(),
                    "resource": table.as_deref().unwrap_or("unknown"),
                });
                (status, axum::response::Json(body)).into_response()
            }
            _ => (status, self.user_message()).into_response(),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_codes_follow_fault_category() {
        let cases = [
            (
                Error::BadRequest {
                    message: "bad".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::Database(DbError::UnresolvedReference {
                    entity: "Role",
                    id: "r1".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (Error::Database(DbError::NoFieldsToUpdate), StatusCode::BAD_REQUEST),
            (Error::Database(DbError::NotFound), StatusCode::NOT_FOUND),
            (
                Error::Database(DbError::InvalidData {
                    message: "value too long for type character varying(15)".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::Database(DbError::UniqueViolation {
                    constraint: Some("credentials_username_unique".to_string()),
                    table: Some("credentials".to_string()),
                    message: "duplicate".to_string(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                Error::Database(DbError::TimedOut {
                    timeout: Duration::from_secs(1),
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                Error::Database(DbError::Unavailable(sqlx::Error::PoolTimedOut)),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                Error::Database(DbError::CommitFailed(sqlx::Error::PoolClosed)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Error::Database(DbError::CredentialPreparation {
                    message: "hash".to_string(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "wrong status for {error:?}");
        }
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = Error::Database(DbError::InsertFailed {
            table: "profiles",
            source: sqlx::Error::Protocol("secret detail".to_string()),
        });
        assert!(!err.user_message().contains("secret detail"));

        let err = Error::Database(DbError::UniqueViolation {
            constraint: Some("credentials_username_unique".to_string()),
            table: Some("credentials".to_string()),
            message: "duplicate key".to_string(),
        });
        assert_eq!(err.user_message(), "This username is already taken");
    }
}
