//! Metadata store error types.

use thiserror::Error;

/// Metadata store operation errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;

impl From<std::io::Error> for MetadataError {
    fn from(e: std::io::Error) -> Self {
        MetadataError::Config(e.to_string())
    }
}

/// Translate a unique-key violation into `AlreadyExists`, passing every other
/// error through unchanged.
///
/// Both SQLite and MySQL report the violation through
/// [`sqlx::error::DatabaseError::is_unique_violation`], so backends share this.
pub(crate) fn map_unique_violation(err: sqlx::Error, what: impl FnOnce() -> String) -> MetadataError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            MetadataError::AlreadyExists(what())
        }
        other => MetadataError::Database(other),
    }
}
