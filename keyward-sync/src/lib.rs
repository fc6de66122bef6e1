//! Encrypted backup sync for Keyward.
//!
//! Everything leaving the device is sealed under the vault key before
//! the remote sees it. The remote stores one opaque blob per user and
//! can neither read nor forge it; restores replace local state
//! atomically. Device-bound secrets (the biometric wrapping secret)
//! never enter a backup payload.

mod backup;
mod config;
mod error;
mod identity;
mod remote;

pub use backup::{BackupService, SyncState, SyncStatus};
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use identity::{IdentityProvider, StaticIdentity, UserId};
pub use remote::{
    HttpBlobStore, MemoryBlobStore, RemoteBackup, RemoteBlobStore, BACKUP_FORMAT_TAG,
};
