//! Error types for SQLite execution.

use oxide_query_core::error::{ProjectionMappingError, SerializeError};
use oxide_query_core::QueryError;
use thiserror::Error;

/// Errors raised while running queries against SQLite.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// Rendering or mapping failed before or after the round trip.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<SerializeError> for SqliteError {
    fn from(err: SerializeError) -> Self {
        Self::Query(err.into())
    }
}

impl From<ProjectionMappingError> for SqliteError {
    fn from(err: ProjectionMappingError) -> Self {
        Self::Query(err.into())
    }
}

/// Result type alias for SQLite operations.
pub type Result<T> = std::result::Result<T, SqliteError>;
