//! Backup upload and restore.
//!
//! Snapshots the whole vault (records plus factor registry, minus
//! device-local secrets), seals it under the vault key, and swaps the
//! blob with the remote per-user store. Downloads reverse the process
//! and replace local state atomically.

use crate::error::{SyncError, SyncResult};
use crate::identity::{IdentityProvider, UserId};
use crate::remote::{RemoteBackup, RemoteBlobStore, BACKUP_FORMAT_TAG};
use chrono::{DateTime, Utc};
use keyward_crypto::{open_from_string, seal_to_string, DerivedKey};
use keyward_storage::{LocalStore, SettingEntry, VaultRecord};
use keyward_vault::{SessionManager, LOCAL_ONLY_KEYS};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Payload schema version stamped inside the encrypted blob.
const PAYLOAD_VERSION: u32 = 1;

/// What actually gets sealed and shipped.
#[derive(Debug, Serialize, Deserialize)]
struct BackupPayload {
    version: u32,
    records: Vec<VaultRecord>,
    settings: Vec<SettingEntry>,
    exported_at: DateTime<Utc>,
}

/// Where the last sync attempt ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Idle,
    Syncing,
    Success,
    Error,
}

/// Sync status reported to the UI.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncStatus {
    pub state: SyncState,
    pub last_synced: Option<DateTime<Utc>>,
    /// Hex digest of the last uploaded or restored blob.
    pub last_digest: Option<String>,
}

/// Drives encrypted backup exchange for one vault.
///
/// Holds the vault key only for the duration of a single call; between
/// calls the session manager owns all key material.
pub struct BackupService {
    session: Arc<SessionManager>,
    store: Arc<LocalStore>,
    identity: Arc<dyn IdentityProvider>,
    remote: Arc<dyn RemoteBlobStore>,
    status: RwLock<SyncStatus>,
}

impl BackupService {
    pub fn new(
        session: Arc<SessionManager>,
        store: Arc<LocalStore>,
        identity: Arc<dyn IdentityProvider>,
        remote: Arc<dyn RemoteBlobStore>,
    ) -> Self {
        Self {
            session,
            store,
            identity,
            remote,
            status: RwLock::new(SyncStatus {
                state: SyncState::Idle,
                last_synced: None,
                last_digest: None,
            }),
        }
    }

    pub async fn status(&self) -> SyncStatus {
        self.status.read().await.clone()
    }

    /// Uploads a fresh encrypted snapshot, replacing the remote blob.
    ///
    /// Returns `Ok(false)` without side effects when the vault is locked
    /// or nobody is signed in, so background callers can fire this
    /// opportunistically.
    pub async fn upload_backup(&self) -> SyncResult<bool> {
        let Some(vault_key) = self.session.vault_key_snapshot().await else {
            debug!("backup skipped, vault is locked");
            return Ok(false);
        };
        let Some(user) = self.identity.current_user().await else {
            debug!("backup skipped, no authenticated user");
            return Ok(false);
        };

        self.set_state(SyncState::Syncing).await;
        match self.upload_inner(&vault_key, &user).await {
            Ok(digest) => {
                self.record_success(digest).await;
                Ok(true)
            }
            Err(e) => {
                self.set_state(SyncState::Error).await;
                Err(e)
            }
        }
    }

    /// Fetches and restores the remote backup, replacing local records.
    ///
    /// Returns `Ok(false)` when no backup exists yet; that is a normal
    /// state, not an error. A blob sealed under a different vault key
    /// fails with `Decryption`.
    pub async fn download_backup(&self) -> SyncResult<bool> {
        let Some(vault_key) = self.session.vault_key_snapshot().await else {
            return Err(SyncError::Locked);
        };
        let Some(user) = self.identity.current_user().await else {
            return Err(SyncError::NotAuthenticated);
        };

        self.set_state(SyncState::Syncing).await;
        match self.download_inner(&vault_key, &user).await {
            Ok(Some(digest)) => {
                self.record_success(digest).await;
                Ok(true)
            }
            Ok(None) => {
                self.set_state(SyncState::Idle).await;
                Ok(false)
            }
            Err(e) => {
                self.set_state(SyncState::Error).await;
                Err(e)
            }
        }
    }

    /// Fire-and-forget upload for background callers. Errors are logged
    /// and swallowed.
    pub async fn upload_backup_silent(&self) -> bool {
        match self.upload_backup().await {
            Ok(uploaded) => uploaded,
            Err(e) => {
                warn!("background backup failed: {e}");
                false
            }
        }
    }

    async fn upload_inner(&self, vault_key: &DerivedKey, user: &UserId) -> SyncResult<String> {
        let payload = self.collect_payload()?;
        let bytes = serde_json::to_vec(&payload)?;
        let blob =
            seal_to_string(vault_key, &bytes).map_err(|e| SyncError::Crypto(e.to_string()))?;
        let digest = hex::encode(Sha256::digest(blob.as_bytes()));

        let backup = RemoteBackup {
            encrypted_blob: blob,
            format_tag: BACKUP_FORMAT_TAG.to_string(),
            updated_at: Utc::now(),
        };
        self.remote.put(user, &backup).await?;

        info!(
            "uploaded backup for {user}: {} records, digest {}",
            payload.records.len(),
            &digest[..12]
        );
        Ok(digest)
    }

    async fn download_inner(
        &self,
        vault_key: &DerivedKey,
        user: &UserId,
    ) -> SyncResult<Option<String>> {
        let Some(backup) = self.remote.get(user).await? else {
            debug!("no backup stored for {user}");
            return Ok(None);
        };

        if backup.format_tag != BACKUP_FORMAT_TAG {
            return Err(SyncError::UnsupportedFormat(backup.format_tag));
        }

        let bytes = open_from_string(vault_key, &backup.encrypted_blob)
            .map_err(|e| SyncError::Decryption(e.to_string()))?;
        let payload: BackupPayload = serde_json::from_slice(&bytes)?;
        if payload.version != PAYLOAD_VERSION {
            return Err(SyncError::UnsupportedFormat(format!(
                "payload version {}",
                payload.version
            )));
        }

        let digest = hex::encode(Sha256::digest(backup.encrypted_blob.as_bytes()));
        self.store
            .replace_snapshot(&payload.records, &payload.settings)?;

        info!(
            "restored backup for {user}: {} records, digest {}",
            payload.records.len(),
            &digest[..12]
        );
        Ok(Some(digest))
    }

    /// Everything worth shipping: all records, plus factor settings with
    /// device-local keys filtered out.
    fn collect_payload(&self) -> SyncResult<BackupPayload> {
        let records = self.store.list_records()?;
        let settings = self
            .store
            .all_settings()?
            .into_iter()
            .filter(|s| !LOCAL_ONLY_KEYS.contains(&s.key.as_str()))
            .collect();

        Ok(BackupPayload {
            version: PAYLOAD_VERSION,
            records,
            settings,
            exported_at: Utc::now(),
        })
    }

    async fn set_state(&self, state: SyncState) {
        self.status.write().await.state = state;
    }

    async fn record_success(&self, digest: String) {
        let mut status = self.status.write().await;
        status.state = SyncState::Success;
        status.last_synced = Some(Utc::now());
        status.last_digest = Some(digest);
    }
}
