//! Database error types
//!
//! This module defines the error types that can occur during database operations,
//! and their translation into the port and domain error types.

use thiserror::Error;

use core_kernel::PortError;
use domain_cid::CidError;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry on {constraint}: {message}")]
    DuplicateEntry { constraint: String, message: String },

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Transaction error
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be mapped back to the domain
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("Submission", "CID-123");
    /// assert!(error.to_string().contains("Submission"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry { .. }
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }

    /// True for a unique violation of the named constraint
    pub fn violates(&self, name: &str) -> bool {
        matches!(self, DatabaseError::DuplicateEntry { constraint, .. } if constraint == name)
    }
}

/// Maps SQLx errors onto `DatabaseError` using the PostgreSQL error code
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseError::SerializationError(error.to_string())
            }
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry {
                        constraint: db_err.constraint().unwrap_or_default().to_string(),
                        message,
                    },
                    Some("23503") => DatabaseError::ForeignKeyViolation(message),
                    Some("23514") => DatabaseError::ConstraintViolation(message),
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::from(&error)
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(id) => PortError::not_found("Record", id),
            error if error.is_connection_error() => PortError::Connection {
                message: error.to_string(),
                source: Some(Box::new(error)),
            },
            error if error.is_constraint_violation() => PortError::Conflict {
                message: error.to_string(),
            },
            other => PortError::Internal {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

impl From<DatabaseError> for CidError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(id) => CidError::NotFound(id),
            other => CidError::Storage(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error = DatabaseError::from(&sqlx::Error::RowNotFound);
        assert!(error.is_not_found());
        assert!(matches!(CidError::from(error), CidError::NotFound(_)));
    }

    #[test]
    fn test_pool_timeout_is_transient_port_error() {
        let error: PortError = DatabaseError::from(sqlx::Error::PoolTimedOut).into();
        assert!(error.is_transient());
    }

    #[test]
    fn test_violates_matches_constraint_name() {
        let error = DatabaseError::DuplicateEntry {
            constraint: "cid_submissions_pkey".to_string(),
            message: "duplicate key".to_string(),
        };
        assert!(error.violates("cid_submissions_pkey"));
        assert!(!error.violates("cid_submissions_content_hash_key"));
        assert!(error.is_constraint_violation());
    }

    #[test]
    fn test_constraint_violations_are_permanent_conflicts() {
        let error: PortError = DatabaseError::ForeignKeyViolation("missing document".to_string()).into();
        assert!(matches!(error, PortError::Conflict { .. }));
        assert!(!error.is_transient());

        let error: PortError = DatabaseError::ConnectionFailed("reset by peer".to_string()).into();
        assert!(matches!(error, PortError::Connection { .. }));
    }
}
