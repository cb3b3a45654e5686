//! Change logger interface, log entries and the in-memory change log.
//!
//! Loggers receive a [`ChangeEvent`] borrowed from the tracker and persist a
//! [`LogEntry`] holding only log-safe JSON, so every backend stores the same
//! rendering of a diff.

use crate::diff::model::Diff;
use crate::errors::{KronosError, Result};
use crate::model::Metadata;
use crate::render::metadata_to_log_safe;
use chrono::{DateTime, Utc};
use kronos_core_types::EntryId;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// What happened to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
            ChangeKind::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChangeKind {
    type Err = KronosError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "created" => Ok(ChangeKind::Created),
            "updated" => Ok(ChangeKind::Updated),
            "deleted" => Ok(ChangeKind::Deleted),
            other => Err(KronosError::Serialization {
                message: format!("unknown change kind '{}'", other),
            }),
        }
    }
}

/// One change handed to a [`ChangeLogger`].
///
/// `diff` is `None` for deletions.
#[derive(Debug, Clone, Copy)]
pub struct ChangeEvent<'a> {
    pub entity_type: &'a str,
    pub entity_key: &'a str,
    pub diff: Option<&'a Diff>,
    pub kind: ChangeKind,
    pub metadata: &'a Metadata,
}

/// A persisted change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: EntryId,
    pub entity_type: String,
    pub entity_key: String,
    pub kind: ChangeKind,
    pub created_at: DateTime<Utc>,
    /// Log-safe rendering of the diff; absent for deletions
    pub diff: Option<serde_json::Value>,
    /// Log-safe rendering of the event metadata
    pub metadata: serde_json::Value,
}

impl LogEntry {
    /// Render an event into a new entry stamped `created_at`.
    pub fn from_event(event: &ChangeEvent<'_>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: EntryId::new(),
            entity_type: event.entity_type.to_string(),
            entity_key: event.entity_key.to_string(),
            kind: event.kind,
            created_at,
            diff: event.diff.map(Diff::to_log_safe),
            metadata: metadata_to_log_safe(event.metadata),
        }
    }
}

/// Result ordering for [`ChangeLogger::history`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Filters for [`ChangeLogger::history`].
///
/// `date_from` is inclusive, `date_to` exclusive. `limit` applies after
/// ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub order: HistoryOrder,
}

impl HistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn since(mut self, date_from: DateTime<Utc>) -> Self {
        self.date_from = Some(date_from);
        self
    }

    pub fn until(mut self, date_to: DateTime<Utc>) -> Self {
        self.date_to = Some(date_to);
        self
    }

    pub fn oldest_first(mut self) -> Self {
        self.order = HistoryOrder::OldestFirst;
        self
    }

    /// Whether `created_at` falls inside the date window.
    pub fn in_window(&self, created_at: &DateTime<Utc>) -> bool {
        !matches!(self.date_from, Some(from) if *created_at < from)
            && !matches!(self.date_to, Some(to) if *created_at >= to)
    }
}

/// Sink and query surface for logged changes.
pub trait ChangeLogger: Send + Sync {
    /// Record one change.
    ///
    /// # Errors
    ///
    /// Returns `KronosError::ChangeLog` if the entry cannot be persisted.
    fn log(&self, event: ChangeEvent<'_>) -> Result<()>;

    /// Entries for `entity_type` matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `KronosError::ChangeLog` if the backend cannot be queried.
    fn history(&self, entity_type: &str, query: &HistoryQuery) -> Result<Vec<LogEntry>>;

    /// Newest entry for `entity_type`.
    ///
    /// # Errors
    ///
    /// See [`history`](Self::history).
    fn last_change(&self, entity_type: &str) -> Result<Option<LogEntry>> {
        Ok(self
            .history(entity_type, &HistoryQuery::new().limit(1))?
            .into_iter()
            .next())
    }

    /// Oldest entry for `entity_type`.
    ///
    /// # Errors
    ///
    /// See [`history`](Self::history).
    fn first_change(&self, entity_type: &str) -> Result<Option<LogEntry>> {
        Ok(self
            .history(entity_type, &HistoryQuery::new().oldest_first().limit(1))?
            .into_iter()
            .next())
    }
}

impl<T: ChangeLogger + ?Sized> ChangeLogger for Arc<T> {
    fn log(&self, event: ChangeEvent<'_>) -> Result<()> {
        (**self).log(event)
    }

    fn history(&self, entity_type: &str, query: &HistoryQuery) -> Result<Vec<LogEntry>> {
        (**self).history(entity_type, query)
    }

    fn last_change(&self, entity_type: &str) -> Result<Option<LogEntry>> {
        (**self).last_change(entity_type)
    }

    fn first_change(&self, entity_type: &str) -> Result<Option<LogEntry>> {
        (**self).first_change(entity_type)
    }
}

/// Process-local change log.
///
/// Entries with equal timestamps keep their insertion order.
#[derive(Debug, Default)]
pub struct MemoryChangeLog {
    entries: RwLock<Vec<LogEntry>>,
}

fn poisoned(op: &str) -> KronosError {
    KronosError::ChangeLog {
        op: op.to_string(),
        message: "change log lock poisoned".to_string(),
    }
}

impl MemoryChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a prepared entry.
    ///
    /// # Errors
    ///
    /// Returns `KronosError::ChangeLog` if the log lock is poisoned.
    pub fn append(&self, entry: LogEntry) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| poisoned("append"))?
            .push(entry);
        Ok(())
    }

    /// Every entry in insertion order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChangeLogger for MemoryChangeLog {
    fn log(&self, event: ChangeEvent<'_>) -> Result<()> {
        self.append(LogEntry::from_event(&event, Utc::now()))
    }

    fn history(&self, entity_type: &str, query: &HistoryQuery) -> Result<Vec<LogEntry>> {
        let entries = self.entries.read().map_err(|_| poisoned("history"))?;

        let mut matched: Vec<LogEntry> = entries
            .iter()
            .filter(|e| e.entity_type == entity_type && query.in_window(&e.created_at))
            .cloned()
            .collect();

        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        if query.order == HistoryOrder::NewestFirst {
            matched.reverse();
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }
}
