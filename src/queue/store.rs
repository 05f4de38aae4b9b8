//! SQLite-backed durable write queue.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::item::{OperationType, QueueItem};
use crate::error::{Result, WorkerError};

/// Name pages use to address the queue store.
pub const QUEUE_STORE_NAME: &str = "offline-queue";

/// Schema version, kept in `PRAGMA user_version`.
pub const QUEUE_STORE_VERSION: i32 = 1;

/// Schema for the queue collection.
const QUEUE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS pending_writes (
    id TEXT PRIMARY KEY,
    type TEXT NOT NULL,
    endpoint TEXT NOT NULL,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pending_writes_created_at
    ON pending_writes(created_at);
"#;

/// A stored row whose payload is not valid JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedItem {
    pub id: String,
    pub kind: OperationType,
    pub endpoint: String,
    pub raw_payload: String,
    pub created_at: String,
    pub error: String,
}

/// One row as read back for a drain.
pub type StoredItem = std::result::Result<QueueItem, MalformedItem>;

struct RawRow {
    id: String,
    kind: String,
    endpoint: String,
    payload: String,
    created_at: String,
}

impl RawRow {
    fn decode(self) -> StoredItem {
        match serde_json::from_str(&self.payload) {
            Ok(payload) => Ok(QueueItem {
                id: self.id,
                kind: self.kind.into(),
                endpoint: self.endpoint,
                payload,
                created_at: self.created_at,
            }),
            Err(e) => Err(MalformedItem {
                id: self.id,
                kind: self.kind.into(),
                endpoint: self.endpoint,
                raw_payload: self.payload,
                created_at: self.created_at,
                error: e.to_string(),
            }),
        }
    }
}

/// Ordered store of pending mutating operations.
///
/// Each call is its own transaction; nothing is cached in memory.
pub struct WriteQueue {
    conn: Mutex<Connection>,
}

impl WriteQueue {
    /// Opens (creating on first run) the queue database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                WorkerError::Storage(format!("Failed to create queue directory: {}", e))
            })?;
        }

        let conn = Connection::open(path)?;
        info!(store = QUEUE_STORE_NAME, path = %path.display(), "Opened write queue");
        Self::init(conn)
    }

    /// Opens a queue that lives only as long as the value.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version > QUEUE_STORE_VERSION {
            return Err(WorkerError::Storage(format!(
                "{} schema version {} is newer than supported version {}",
                QUEUE_STORE_NAME, version, QUEUE_STORE_VERSION
            )));
        }

        conn.execute_batch(QUEUE_SCHEMA)?;
        conn.pragma_update(None, "user_version", QUEUE_STORE_VERSION)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| WorkerError::Internal(format!("Lock poisoned: {}", e)))
    }

    /// Writes a new item. This is the page side of the queue contract; the
    /// worker itself only reads and removes.
    pub fn enqueue(&self, item: &QueueItem) -> Result<()> {
        let payload = serde_json::to_string(&item.payload)?;
        self.conn()?.execute(
            "INSERT INTO pending_writes (id, type, endpoint, payload, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![item.id, item.kind.as_str(), item.endpoint, payload, item.created_at],
        )?;
        debug!(id = %item.id, kind = %item.kind, "Enqueued write");
        Ok(())
    }

    /// Every item, oldest `created_at` first.
    ///
    /// A payload that is not valid JSON is listed as its raw text.
    pub fn get_all(&self) -> Result<Vec<QueueItem>> {
        let rows = self.select(
            "SELECT id, type, endpoint, payload, created_at FROM pending_writes
             ORDER BY created_at ASC, id ASC",
            [],
        )?;

        Ok(rows
            .into_iter()
            .map(|row| match row.decode() {
                Ok(item) => item,
                Err(malformed) => {
                    warn!(
                        id = %malformed.id,
                        error = %malformed.error,
                        "Listing undecodable payload as text"
                    );
                    QueueItem {
                        id: malformed.id,
                        kind: malformed.kind,
                        endpoint: malformed.endpoint,
                        payload: Value::String(malformed.raw_payload),
                        created_at: malformed.created_at,
                    }
                }
            })
            .collect())
    }

    /// Items of one operation type, oldest `created_at` first.
    ///
    /// Rows are decoded one by one, so a bad payload only affects its own
    /// position in the result.
    pub fn get_by_type(&self, kind: &OperationType) -> Result<Vec<StoredItem>> {
        let rows = self.select(
            "SELECT id, type, endpoint, payload, created_at FROM pending_writes
             WHERE type = ?
             ORDER BY created_at ASC, id ASC",
            params![kind.as_str()],
        )?;
        Ok(rows.into_iter().map(RawRow::decode).collect())
    }

    fn select(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<RawRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(RawRow {
                id: row.get(0)?,
                kind: row.get(1)?,
                endpoint: row.get(2)?,
                payload: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Deletes one item. Removing an absent id is not an error.
    pub fn remove(&self, id: &str) -> Result<()> {
        let deleted = self
            .conn()?
            .execute("DELETE FROM pending_writes WHERE id = ?", params![id])?;
        debug!(id = %id, deleted, "Removed queued write");
        Ok(())
    }

    /// Writes a row with its payload text as given, like a page that skipped
    /// JSON encoding.
    #[cfg(test)]
    pub(crate) fn insert_raw(
        &self,
        id: &str,
        kind: &str,
        endpoint: &str,
        payload: &str,
        created_at: &str,
    ) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO pending_writes (id, type, endpoint, payload, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![id, kind, endpoint, payload, created_at],
        )?;
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 =
            self.conn()?
                .query_row("SELECT COUNT(*) FROM pending_writes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
