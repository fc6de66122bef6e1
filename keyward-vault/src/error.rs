//! Error types for session and factor management.

use keyward_storage::StorageError;
use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("vault not configured")]
    NotConfigured,
    #[error("vault already configured")]
    AlreadyConfigured,
    #[error("vault is locked")]
    Locked,
    #[error("password too short (min 8 characters)")]
    PasswordTooShort,
    #[error("wrong password")]
    WrongPassword,
    #[error("invalid recovery phrase")]
    InvalidRecoveryPhrase,
    #[error("recovery not configured")]
    RecoveryNotConfigured,
    #[error("no recovery session pending")]
    SessionExpired,
    #[error("biometric factor not enrolled")]
    BiometryNotEnrolled,
    #[error("biometric authenticator unavailable")]
    BiometryUnavailable,
    #[error("biometric presence check denied")]
    BiometryDenied,
    #[error("stored factor data corrupted: {0}")]
    Corrupted(String),
    #[error("decryption failed: {0}")]
    Decryption(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("crypto error: {0}")]
    Crypto(String),
}
