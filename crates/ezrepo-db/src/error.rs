//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller's CRUD logic                                                    │
//! │                                                                         │
//! │  "No rows" is NOT an error here: finds return None / empty Vec.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a row whose key or unique column already exists
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a child that references a missing parent
    /// - Deleting a parent that still has children
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// The operation needs a primary key the model does not have.
    ///
    /// ## When This Occurs
    /// - Deleting a model that was never inserted
    /// - A model without an integer key that did not override `delete`
    #[error("LOGIC ERROR: {entity} has no primary key. Implement override function")]
    MissingPrimaryKey { entity: String },

    /// A preload path names a relation the model does not dispatch.
    #[error("{entity} has no relation named '{relation}'")]
    UnknownRelation { entity: String, relation: String },

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a MissingPrimaryKey error for a given entity.
    pub fn missing_key(entity: impl Into<String>) -> Self {
        DbError::MissingPrimaryKey {
            entity: entity.into(),
        }
    }

    /// Creates an UnknownRelation error.
    pub fn unknown_relation(entity: impl Into<String>, relation: impl Into<String>) -> Self {
        DbError::UnknownRelation {
            entity: entity.into(),
            relation: relation.into(),
        }
    }

    /// Prefixes the message of query failures with what was being done.
    pub(crate) fn context(self, action: &str) -> Self {
        match self {
            DbError::QueryFailed(msg) => DbError::QueryFailed(format!("{}: {}", action, msg)),
            DbError::Internal(msg) => DbError::Internal(format!("{}: {}", action, msg)),
            other => other,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Environment configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================
