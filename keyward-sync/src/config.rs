//! Sync configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the backup sync service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL for the Keyward backup API (e.g., "https://sync.keyward.app").
    pub base_url: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sync.keyward.app".to_string(),
            request_timeout_secs: 30,
        }
    }
}
