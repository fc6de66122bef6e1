//! Settings storage: the `settings` key-value table.

use crate::error::StorageResult;
use crate::LocalStore;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// One settings row, as carried in backup payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub key: String,
    pub value: String,
}

impl LocalStore {
    /// Gets a setting value, or `None` if the key is absent.
    pub fn get_setting(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.lock_conn()?;
        let result = conn.query_row(
            "SELECT value FROM settings WHERE key = ?",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Saves (upserts) a single setting.
    pub fn put_setting(&self, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.lock_conn()?;
        upsert_setting(&conn, key, value)
    }

    /// Saves several settings in one transaction.
    ///
    /// The factor registry writes related keys (salt, wrapped key, verifier)
    /// through this so a crash can never leave half a factor behind.
    pub fn put_settings(&self, entries: &[(&str, String)]) -> StorageResult<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        for (key, value) in entries {
            upsert_setting(&tx, key, value)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Deletes a setting. Deleting an absent key is not an error.
    pub fn delete_setting(&self, key: &str) -> StorageResult<()> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM settings WHERE key = ?", params![key])?;
        Ok(())
    }

    /// Lists all settings ordered by key.
    pub fn all_settings(&self) -> StorageResult<Vec<SettingEntry>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
        let entries = stmt
            .query_map([], |row| {
                Ok(SettingEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

pub(crate) fn upsert_setting(conn: &Connection, key: &str, value: &str) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
        params![key, value],
    )?;
    Ok(())
}
