//! SQLite storage layer for Keyward.
//!
//! A single [`LocalStore`] owns one SQLite connection and exposes two tables:
//! `records` for vault entries and `settings` for the factor registry and
//! other small metadata. Record and settings operations live in their own
//! modules as `impl LocalStore` extensions.
//!
//! The store never sees key material in the clear. Wrapped keys, salts, and
//! the password verifier arrive as opaque JSON strings in `settings`; record
//! plaintext is only ever written while the vault is unlocked.

mod error;
mod records;
mod settings;

pub use error::{StorageError, StorageResult};
pub use records::VaultRecord;
pub use settings::SettingEntry;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Local persistence for vault records and settings, backed by SQLite.
#[derive(Clone)]
pub struct LocalStore {
    conn: Arc<Mutex<Connection>>,
}

impl LocalStore {
    /// Opens or creates a store at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "wal")?;
        initialize_schema(&conn)?;
        info!("opened local store at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn lock_conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Replaces every record and overlays settings in a single transaction.
    ///
    /// Used when restoring from a backup. Records are a full replacement;
    /// settings are upserted key by key and never cleared, so keys absent
    /// from the snapshot (the device-local biometric secret in particular)
    /// survive the restore. If any row fails, the whole restore rolls back.
    pub fn replace_snapshot(
        &self,
        records: &[VaultRecord],
        settings: &[SettingEntry],
    ) -> StorageResult<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM records", [])?;
        for record in records {
            records::insert_record(&tx, record)?;
        }
        for entry in settings {
            settings::upsert_setting(&tx, &entry.key, &entry.value)?;
        }

        tx.commit()?;
        debug!(
            "replaced snapshot: {} records, {} settings",
            records.len(),
            settings.len()
        );
        Ok(())
    }
}

fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            username TEXT NOT NULL,
            password TEXT NOT NULL,
            url TEXT,
            notes TEXT,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_records_updated ON records(updated_at DESC);

        -- Settings: key-value table holding the factor registry (salts,
        -- wrapped keys, verifier) and other vault metadata as JSON strings.
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT NOT NULL PRIMARY KEY,
            value TEXT NOT NULL
        );

        PRAGMA user_version = 1;
        "#,
    )?;
    Ok(())
}
