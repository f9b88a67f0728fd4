//! Error types for docbay-state

use thiserror::Error;

/// Errors that can occur while connecting to or migrating the database
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

/// Errors raised by registry trait operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Redirect status code outside the allowed set
    #[error("invalid redirect status code: {status_code}")]
    InvalidStatusCode { status_code: u16 },

    /// Stored row could not be mapped back to a registry record
    #[error("corrupt registry row: {reason}")]
    CorruptRow { reason: String },

    /// Backend failure (query, connection, serialization)
    #[error("storage backend error: {0}")]
    Backend(String),
}
