//! Sync error types.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during backup sync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no authenticated user")]
    NotAuthenticated,

    #[error("vault is locked")]
    Locked,

    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("unsupported backup format: {0}")]
    UnsupportedFormat(String),

    #[error("backup decryption failed: {0}")]
    Decryption(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] keyward_storage::StorageError),
}
