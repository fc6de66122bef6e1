//! Remote blob store interface and implementations.
//!
//! The remote holds exactly one encrypted blob per user, replaced
//! wholesale on every upload. It never sees plaintext or key material.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::identity::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Format tag stamped on every uploaded backup.
pub const BACKUP_FORMAT_TAG: &str = "keyward-backup-v1";

/// Wire shape of one stored backup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteBackup {
    /// Sealed backup payload as opaque text (base64 nonce + ciphertext).
    pub encrypted_blob: String,
    pub format_tag: String,
    pub updated_at: DateTime<Utc>,
}

/// Per-user encrypted backup storage.
#[async_trait]
pub trait RemoteBlobStore: Send + Sync {
    /// Replaces the user's backup.
    async fn put(&self, user: &UserId, backup: &RemoteBackup) -> SyncResult<()>;

    /// Fetches the user's backup, or `None` if nothing was ever uploaded.
    async fn get(&self, user: &UserId) -> SyncResult<Option<RemoteBackup>>;
}

// ── In-memory store ──────────────────────────────────────────────

/// Keeps backups in a map. Used in tests and offline development.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, RemoteBackup>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemoteBlobStore for MemoryBlobStore {
    async fn put(&self, user: &UserId, backup: &RemoteBackup) -> SyncResult<()> {
        self.blobs
            .write()
            .await
            .insert(user.0.clone(), backup.clone());
        Ok(())
    }

    async fn get(&self, user: &UserId) -> SyncResult<Option<RemoteBackup>> {
        Ok(self.blobs.read().await.get(&user.0).cloned())
    }
}

// ── HTTP store ───────────────────────────────────────────────────

/// Talks to the backup API over HTTPS.
pub struct HttpBlobStore {
    client: reqwest::Client,
    config: SyncConfig,
}

impl HttpBlobStore {
    pub fn new(config: SyncConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self { client, config }
    }

    fn backup_url(&self, user: &UserId) -> String {
        format!(
            "{}/backups/{}",
            self.config.base_url,
            urlencoding::encode(&user.0)
        )
    }
}

#[async_trait]
impl RemoteBlobStore for HttpBlobStore {
    async fn put(&self, user: &UserId, backup: &RemoteBackup) -> SyncResult<()> {
        let url = self.backup_url(user);
        self.client
            .put(&url)
            .json(backup)
            .send()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| SyncError::RemoteUnavailable(e.to_string()))?;

        debug!("stored backup blob for {user}");
        Ok(())
    }

    async fn get(&self, user: &UserId) -> SyncResult<Option<RemoteBackup>> {
        let url = self.backup_url(user);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let backup = resp
            .error_for_status()
            .map_err(|e| SyncError::RemoteUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(e.to_string()))?;
        Ok(Some(backup))
    }
}
