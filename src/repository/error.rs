// ==========================================
// Academic Records Platform - repository layer error types
// ==========================================
// Tooling: thiserror derive macros
// ==========================================

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Repository layer error type
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== database errors =====
    #[error("record not found: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("database lock acquisition failed: {0}")]
    LockError(String),

    #[error("database transaction failed: {0}")]
    DatabaseTransactionError(String),

    #[error("database query failed: {0}")]
    DatabaseQueryError(String),

    #[error("unique constraint violation: {0}")]
    UniqueConstraintViolation(String),

    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    // ===== business rule errors =====
    #[error("business rule violation: {0}")]
    BusinessRuleViolation(String),

    // ===== data quality errors =====
    #[error("data validation failed: {0}")]
    ValidationError(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),

    // ===== generic errors =====
    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

/// Result type alias
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Parse a stored RFC 3339 timestamp column
///
/// A row with an unreadable timestamp is corrupt data; it must surface
/// as an error, not be silently replaced (a replaced `enrolled_at`
/// would reorder the student's enrollment history).
pub(crate) fn parse_timestamp(
    value: &str,
    column: &str,
    row_id: &str,
) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            RepositoryError::ValidationError(format!(
                "unreadable {} '{}' on row {}: {}",
                column, value, row_id, e
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("2025-09-01T08:00:00+00:00", "enrolled_at", "en1").is_ok());
        let err = parse_timestamp("not-a-date", "enrolled_at", "en1").unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError(_)));
        assert!(err.to_string().contains("enrolled_at"));
    }
}
