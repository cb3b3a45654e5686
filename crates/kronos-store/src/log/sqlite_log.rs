//! SQLite change log
//!
//! Entries are rendered to log-safe JSON before they are written, so a
//! history read returns exactly what `MemoryChangeLog` would hold.

#![allow(clippy::result_large_err)]

use crate::db;
use crate::errors::{corrupt_row, from_rusqlite, Result};
use crate::migrations::apply_migrations;
use chrono::{DateTime, SecondsFormat, Utc};
use kronos_core::change_log::{
    ChangeEvent, ChangeKind, ChangeLogger, HistoryOrder, HistoryQuery, LogEntry,
};
use kronos_core::errors::KronosError;
use kronos_core::kronos_core_types::EntryId;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const HISTORY_ASC: &str = "SELECT id, entity_type, entity_key, kind, created_at, diff_json, metadata_json
     FROM change_log
     WHERE entity_type = ?1
       AND (?2 IS NULL OR created_at >= ?2)
       AND (?3 IS NULL OR created_at < ?3)
     ORDER BY created_at ASC, seq ASC
     LIMIT ?4";

const HISTORY_DESC: &str = "SELECT id, entity_type, entity_key, kind, created_at, diff_json, metadata_json
     FROM change_log
     WHERE entity_type = ?1
       AND (?2 IS NULL OR created_at >= ?2)
       AND (?3 IS NULL OR created_at < ?3)
     ORDER BY created_at DESC, seq DESC
     LIMIT ?4";

/// Raw column values of one `change_log` row.
type RawRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
);

/// Change log persisted in a SQLite database.
///
/// A single connection is shared behind a mutex; every call is one short
/// statement, so writers never hold the lock across user code.
#[derive(Debug)]
pub struct SqliteChangeLog {
    conn: Mutex<Connection>,
}

/// Fixed-width RFC 3339 rendering; text order equals time order.
fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| corrupt_row("created_at", e))
}

fn decode_row(row: RawRow) -> Result<LogEntry> {
    let (id, entity_type, entity_key, kind, created_at, diff_json, metadata_json) = row;

    let kind: ChangeKind = kind.parse().map_err(|e: KronosError| corrupt_row("kind", e))?;
    let diff = diff_json
        .map(|text| serde_json::from_str(&text))
        .transpose()
        .map_err(|e| corrupt_row("diff_json", e))?;
    let metadata =
        serde_json::from_str(&metadata_json).map_err(|e| corrupt_row("metadata_json", e))?;

    Ok(LogEntry {
        id: EntryId::from_string(id),
        entity_type,
        entity_key,
        kind,
        created_at: decode_timestamp(&created_at)?,
        diff,
        metadata,
    })
}

impl SqliteChangeLog {
    /// Open (or create) the log database at `path` and apply migrations.
    ///
    /// # Errors
    ///
    /// Returns `KronosError::Store` if the directory cannot be created and
    /// `KronosError::ChangeLog` if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = db::open(path)?;
        Self::from_connection(conn)
    }

    /// Log backed by a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `KronosError::ChangeLog` if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self, op: &str) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| KronosError::ChangeLog {
            op: op.to_string(),
            message: "connection lock poisoned".to_string(),
        })
    }

    /// Persist a prepared entry.
    ///
    /// # Errors
    ///
    /// Returns `KronosError::ChangeLog` if the insert fails, including a
    /// duplicate entry id.
    pub fn append(&self, entry: &LogEntry) -> Result<()> {
        let diff_json = entry
            .diff
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let metadata_json = serde_json::to_string(&entry.metadata)?;

        let conn = self.lock("append")?;
        conn.execute(
            "INSERT INTO change_log
                (id, entity_type, entity_key, kind, created_at, diff_json, metadata_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id.as_str(),
                entry.entity_type,
                entry.entity_key,
                entry.kind.as_str(),
                encode_timestamp(&entry.created_at),
                diff_json,
                metadata_json,
            ],
        )
        .map_err(from_rusqlite)?;

        Ok(())
    }

    /// Number of entries across all entity types.
    ///
    /// # Errors
    ///
    /// Returns `KronosError::ChangeLog` if the count query fails.
    pub fn len(&self) -> Result<usize> {
        let conn = self.lock("len")?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM change_log", [], |row| row.get(0))
            .map_err(from_rusqlite)?;
        Ok(count.max(0) as usize)
    }

    /// Whether the log holds no entries.
    ///
    /// # Errors
    ///
    /// See [`len`](Self::len).
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl ChangeLogger for SqliteChangeLog {
    fn log(&self, event: ChangeEvent<'_>) -> Result<()> {
        self.append(&LogEntry::from_event(&event, Utc::now()))
    }

    fn history(&self, entity_type: &str, query: &HistoryQuery) -> Result<Vec<LogEntry>> {
        let sql = match query.order {
            HistoryOrder::NewestFirst => HISTORY_DESC,
            HistoryOrder::OldestFirst => HISTORY_ASC,
        };
        // SQLite treats a negative LIMIT as unbounded.
        let limit = query
            .limit
            .map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let date_from = query.date_from.as_ref().map(encode_timestamp);
        let date_to = query.date_to.as_ref().map(encode_timestamp);

        let rows: Vec<RawRow> = {
            let conn = self.lock("history")?;
            let mut stmt = conn.prepare_cached(sql).map_err(from_rusqlite)?;
            let mapped = stmt
                .query_map(params![entity_type, date_from, date_to, limit], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                    ))
                })
                .map_err(from_rusqlite)?;
            mapped
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(from_rusqlite)?
        };

        rows.into_iter().map(decode_row).collect()
    }
}
