//! Error types for the storage layer.

use thiserror::Error;
use uuid::Uuid;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("record not found: {0}")]
    RecordNotFound(Uuid),

    #[error("invalid stored value in {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("storage lock poisoned")]
    Poisoned,
}
