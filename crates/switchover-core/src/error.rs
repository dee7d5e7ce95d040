//! Unified error type for the migration core.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("event log error: {0}")]
    EventLog(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

pub type CoreResult<T> = Result<T, CoreError>;
