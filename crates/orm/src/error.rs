//! Error types for the ORM system
//!
//! Provides error handling for entity persistence, query building,
//! relationship resolution, and the lifecycle event system.

use thiserror::Error;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// Database connection or statement error
    #[error("Database error: {0}")]
    Database(String),
    /// Record not found by primary-key lookup
    #[error("Record not found in table '{0}'")]
    NotFound(String),
    /// Primary key is missing or invalid
    #[error("Primary key is missing or invalid")]
    MissingPrimaryKey,
    /// Operation requires a bound database handle
    #[error("No database connection bound to entity '{0}'")]
    ConnectionMissing(String),
    /// Relationship resolution failed
    #[error("Relationship error: {0}")]
    Relationship(String),
    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Query building error
    #[error("Query error: {0}")]
    Query(String),
    /// Event system error
    #[error("Event error: {0}")]
    Event(String),
    /// Entity definition error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

// Convert from anyhow errors
impl From<anyhow::Error> for ModelError {
    fn from(err: anyhow::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

/// Error types for statement building and evaluation
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Malformed WHERE expression
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),
    /// A named placeholder had no bound value
    #[error("Missing parameter: {0}")]
    MissingParameter(String),
    /// Statement shape is incomplete (missing table, columns, ...)
    #[error("Missing fields: {0}")]
    MissingFields(String),
    /// Operation not supported by the statement layer
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl From<QueryError> for ModelError {
    fn from(err: QueryError) -> Self {
        ModelError::Query(err.to_string())
    }
}
