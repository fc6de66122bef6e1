//! Vault record storage: the `records` table.
//!
//! Records are stored as plaintext columns. At-rest protection comes from
//! the OS disk encryption plus the fact that the vault file only holds data
//! the user has already unlocked; the backup path re-encrypts everything
//! under the vault key before it leaves the device.

use crate::error::{StorageError, StorageResult};
use crate::LocalStore;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stored credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRecord {
    pub id: Uuid,
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl VaultRecord {
    /// Creates a new record with a fresh id and the current timestamp.
    pub fn new(
        title: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        // Stored at millisecond precision; construct at the same granularity
        // so a record survives a write/read cycle unchanged.
        let now = Utc::now();
        let updated_at = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);

        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            username: username.into(),
            password: password.into(),
            url: None,
            notes: None,
            updated_at,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl LocalStore {
    /// Lists all records, most recently updated first.
    pub fn list_records(&self) -> StorageResult<Vec<VaultRecord>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, username, password, url, notes, updated_at \
             FROM records ORDER BY updated_at DESC, id ASC",
        )?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        rows.into_iter().map(into_record).collect()
    }

    /// Gets a single record by id.
    pub fn get_record(&self, id: Uuid) -> StorageResult<Option<VaultRecord>> {
        let conn = self.lock_conn()?;
        let result = conn.query_row(
            "SELECT id, title, username, password, url, notes, updated_at \
             FROM records WHERE id = ?",
            params![id.to_string()],
            read_row,
        );

        match result {
            Ok(row) => Ok(Some(into_record(row)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Saves (upserts) a record.
    pub fn upsert_record(&self, record: &VaultRecord) -> StorageResult<()> {
        let conn = self.lock_conn()?;
        insert_record(&conn, record)
    }

    /// Inserts many records in a single transaction.
    pub fn insert_records(&self, records: &[VaultRecord]) -> StorageResult<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        for record in records {
            insert_record(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Deletes a record by id. Fails if no such record exists.
    pub fn delete_record(&self, id: Uuid) -> StorageResult<()> {
        let conn = self.lock_conn()?;
        let affected = conn.execute("DELETE FROM records WHERE id = ?", params![id.to_string()])?;
        if affected == 0 {
            return Err(StorageError::RecordNotFound(id));
        }
        Ok(())
    }

    /// Deletes every record.
    pub fn clear_records(&self) -> StorageResult<()> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM records", [])?;
        Ok(())
    }

    /// Case-insensitive substring search over title and username.
    pub fn search_records(&self, query: &str) -> StorageResult<Vec<VaultRecord>> {
        let conn = self.lock_conn()?;
        let pattern = format!("%{query}%");
        let mut stmt = conn.prepare(
            "SELECT id, title, username, password, url, notes, updated_at FROM records \
             WHERE LOWER(title) LIKE LOWER(?) OR LOWER(username) LIKE LOWER(?) \
             ORDER BY updated_at DESC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![pattern, pattern], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        rows.into_iter().map(into_record).collect()
    }
}

type RecordRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    i64,
);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn into_record(row: RecordRow) -> StorageResult<VaultRecord> {
    let (id, title, username, password, url, notes, updated_ms) = row;

    let id = Uuid::parse_str(&id).map_err(|e| StorageError::InvalidValue {
        field: "records.id",
        reason: e.to_string(),
    })?;
    let updated_at =
        DateTime::from_timestamp_millis(updated_ms).ok_or_else(|| StorageError::InvalidValue {
            field: "records.updated_at",
            reason: format!("timestamp {updated_ms} out of range"),
        })?;

    Ok(VaultRecord {
        id,
        title,
        username,
        password,
        url,
        notes,
        updated_at,
    })
}

pub(crate) fn insert_record(conn: &Connection, record: &VaultRecord) -> StorageResult<()> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO records (
            id, title, username, password, url, notes, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            record.id.to_string(),
            record.title,
            record.username,
            record.password,
            record.url,
            record.notes,
            record.updated_at.timestamp_millis(),
        ],
    )?;
    Ok(())
}
