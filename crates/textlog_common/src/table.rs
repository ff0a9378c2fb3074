//! Error table - SQLite mirror of the text log
//!
//! Schema:
//! - errors: one row per record, `trace_id` unique
//!
//! Unlike the text log, which is one file per day, the table accumulates
//! records across days until cleared.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{IdStore, LogError, Result};
use crate::record::ErrorRecord;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS errors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        trace_id TEXT NOT NULL UNIQUE,
        name VARCHAR(128) NOT NULL,
        text VARCHAR(1024) NOT NULL,
        date DATETIME NOT NULL,
        user_name VARCHAR(64),
        level VARCHAR(10) NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_errors_level ON errors(level);
"#;

const SELECT_COLUMNS: &str = "SELECT trace_id, name, text, date, user_name, level FROM errors";

/// SQLite-backed error table
pub struct ErrorTable {
    conn: Connection,
    path: Option<PathBuf>,
}

impl ErrorTable {
    /// Open or create the table in the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        debug!("Opened error table at {}", path.display());

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory table
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, path: None })
    }

    /// Database file, `None` for in-memory tables
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Start a transaction. Dropping the guard without `commit` rolls back.
    pub fn begin(&mut self) -> Result<ErrorTableTx<'_>> {
        Ok(ErrorTableTx {
            tx: self.conn.transaction()?,
        })
    }

    pub fn contains(&self, trace_id: &str) -> Result<bool> {
        contains(&self.conn, trace_id)
    }

    /// Insert a record on its own, rejecting a duplicate trace id
    pub fn insert(&mut self, record: &ErrorRecord) -> Result<()> {
        let tx = self.begin()?;
        tx.insert(record)?;
        tx.commit()
    }

    /// Rows at `level`, oldest first
    pub fn by_level(&self, level: &str) -> Result<Vec<ErrorRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE level = ?1 ORDER BY id", SELECT_COLUMNS))?;
        let rows = stmt.query_map(params![level], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every row, oldest first
    pub fn all(&self) -> Result<Vec<ErrorRecord>> {
        let mut stmt = self.conn.prepare(&format!("{} ORDER BY id", SELECT_COLUMNS))?;
        let rows = stmt.query_map([], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM errors", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Delete every row and commit. Returns the number of rows removed.
    pub fn delete_all(&mut self) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM errors", [])?;
        tx.commit()?;
        Ok(removed)
    }
}

/// Open transaction on the error table
pub struct ErrorTableTx<'a> {
    tx: Transaction<'a>,
}

impl ErrorTableTx<'_> {
    pub fn contains(&self, trace_id: &str) -> Result<bool> {
        contains(&self.tx, trace_id)
    }

    /// Insert a row, failing with `DuplicateId` if the trace id is present
    pub fn insert(&self, record: &ErrorRecord) -> Result<()> {
        if self.contains(&record.trace_id)? {
            return Err(LogError::DuplicateId {
                trace_id: record.trace_id.clone(),
                store: IdStore::Table,
            });
        }

        self.tx.execute(
            "INSERT INTO errors (trace_id, name, text, date, user_name, level)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.trace_id,
                record.name,
                record.text,
                record.date,
                record.user_name,
                record.level,
            ],
        )?;
        Ok(())
    }

    pub fn commit(self) -> Result<()> {
        Ok(self.tx.commit()?)
    }
}

fn contains(conn: &Connection, trace_id: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM errors WHERE trace_id = ?1",
            params![trace_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ErrorRecord> {
    let date: NaiveDateTime = row.get(3)?;
    Ok(ErrorRecord {
        trace_id: row.get(0)?,
        name: row.get(1)?,
        text: row.get(2)?,
        date,
        user_name: row.get(4)?,
        level: row.get(5)?,
    })
}
