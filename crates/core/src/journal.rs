//! Dispatch audit journal - append-only event storage.
//!
//! This module provides a durable, append-only journal of dispatch lifecycle
//! events with:
//! - SQLite backend with WAL mode for durability
//! - Strict append-only semantics (no updates or deletes)
//! - Monotonic per-journal sequence numbers
//! - Readback queries for audit and operator review
//!
//! The journal is an audit artifact, not the system of record: the in-memory
//! dispatch board stays authoritative and keeps working if journaling is
//! disabled or falls behind.

use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// A single journaled dispatch event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalRecord {
    /// Event time (Unix epoch milliseconds)
    pub recorded_at: u64,
    /// Event kind, e.g. `unit_assigned`
    pub kind: String,
    /// Emergency the event concerns, if any
    pub emergency_id: Option<String>,
    /// Unit the event concerns, if any
    pub unit_id: Option<String>,
    /// Full event payload as JSON
    pub payload: String,
}

/// Errors that can occur in journal operations
#[derive(Debug, Error)]
pub enum JournalError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record failed validation before insert
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Append-only dispatch journal with SQLite backend
pub struct EventJournal {
    conn: Connection,
    appended_total: u64,
}

impl EventJournal {
    /// Create or open a journal at the specified path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref();

        info!(path = %path.display(), "Opening dispatch journal");

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // WAL mode for better concurrency and durability
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn,
            appended_total: 0,
        })
    }

    /// Open an in-memory journal (tests, ephemeral deployments).
    pub fn open_in_memory() -> Result<Self, JournalError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn,
            appended_total: 0,
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), JournalError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS dispatch_journal (
                seq_no INTEGER PRIMARY KEY AUTOINCREMENT,
                recorded_at INTEGER NOT NULL,
                kind TEXT NOT NULL,
                emergency_id TEXT,
                unit_id TEXT,
                payload TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_journal_recorded_at
                ON dispatch_journal(recorded_at);
            CREATE INDEX IF NOT EXISTS idx_journal_emergency
                ON dispatch_journal(emergency_id);
            "#,
        )?;
        Ok(())
    }

    /// Append a record, returning its assigned sequence number.
    pub fn append(&mut self, record: &JournalRecord) -> Result<u64, JournalError> {
        if record.kind.is_empty() {
            return Err(JournalError::InvalidRecord(
                "kind cannot be empty".to_string(),
            ));
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO dispatch_journal (recorded_at, kind, emergency_id, unit_id, payload)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.recorded_at as i64,
                record.kind,
                record.emergency_id,
                record.unit_id,
                record.payload,
            ],
        )?;
        let seq_no = tx.last_insert_rowid() as u64;
        tx.commit()?;

        self.appended_total += 1;
        debug!(seq_no, kind = %record.kind, "Journal record appended");
        Ok(seq_no)
    }

    /// Most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<JournalRecord>, JournalError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT recorded_at, kind, emergency_id, unit_id, payload
            FROM dispatch_journal
            ORDER BY seq_no DESC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(JournalRecord {
                recorded_at: row.get::<_, i64>(0)? as u64,
                kind: row.get(1)?,
                emergency_id: row.get(2)?,
                unit_id: row.get(3)?,
                payload: row.get(4)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// All records for one emergency, oldest first.
    pub fn for_emergency(&self, emergency_id: &str) -> Result<Vec<JournalRecord>, JournalError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT recorded_at, kind, emergency_id, unit_id, payload
            FROM dispatch_journal
            WHERE emergency_id = ?1
            ORDER BY seq_no ASC
            "#,
        )?;
        let rows = stmt.query_map(params![emergency_id], |row| {
            Ok(JournalRecord {
                recorded_at: row.get::<_, i64>(0)? as u64,
                kind: row.get(1)?,
                emergency_id: row.get(2)?,
                unit_id: row.get(3)?,
                payload: row.get(4)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Total records in the journal.
    pub fn len(&self) -> Result<u64, JournalError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM dispatch_journal", [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    /// Whether the journal holds no records.
    pub fn is_empty(&self) -> Result<bool, JournalError> {
        Ok(self.len()? == 0)
    }

    /// Records appended by this handle since it was opened.
    pub fn appended_total(&self) -> u64 {
        self.appended_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: &str, emergency_id: Option<&str>) -> JournalRecord {
        JournalRecord {
            recorded_at: 1000,
            kind: kind.to_string(),
            emergency_id: emergency_id.map(String::from),
            unit_id: Some("unit-1".to_string()),
            payload: "{}".to_string(),
        }
    }

    #[test]
    fn test_append_assigns_increasing_seq_no() {
        let mut journal = EventJournal::open_in_memory().unwrap();

        let first = journal.append(&record("emergency_reported", Some("EMG-1"))).unwrap();
        let second = journal.append(&record("unit_assigned", Some("EMG-1"))).unwrap();

        assert!(second > first);
        assert_eq!(journal.len().unwrap(), 2);
        assert_eq!(journal.appended_total(), 2);
    }

    #[test]
    fn test_recent_returns_newest_first() {
        let mut journal = EventJournal::open_in_memory().unwrap();
        journal.append(&record("emergency_reported", Some("EMG-1"))).unwrap();
        journal.append(&record("unit_assigned", Some("EMG-1"))).unwrap();
        journal.append(&record("emergency_completed", Some("EMG-1"))).unwrap();

        let recent = journal.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].kind, "emergency_completed");
        assert_eq!(recent[1].kind, "unit_assigned");
    }

    #[test]
    fn test_for_emergency_filters_and_orders() {
        let mut journal = EventJournal::open_in_memory().unwrap();
        journal.append(&record("emergency_reported", Some("EMG-1"))).unwrap();
        journal.append(&record("emergency_reported", Some("EMG-2"))).unwrap();
        journal.append(&record("unit_assigned", Some("EMG-1"))).unwrap();

        let records = journal.for_emergency("EMG-1").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, "emergency_reported");
        assert_eq!(records[1].kind, "unit_assigned");
    }

    #[test]
    fn test_empty_kind_rejected() {
        let mut journal = EventJournal::open_in_memory().unwrap();
        let result = journal.append(&record("", None));
        assert!(matches!(result, Err(JournalError::InvalidRecord(_))));
        assert!(journal.is_empty().unwrap());
    }

    #[test]
    fn test_open_on_disk_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "lifelink_journal_test_{}.db",
            lifelink_test_suffix()
        ));
        {
            let mut journal = EventJournal::open(&path).unwrap();
            journal.append(&record("emergency_reported", Some("EMG-9"))).unwrap();
        }
        {
            let journal = EventJournal::open(&path).unwrap();
            assert_eq!(journal.len().unwrap(), 1);
        }
        let _ = std::fs::remove_file(&path);
    }

    fn lifelink_test_suffix() -> String {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        (0..8).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
    }
}
