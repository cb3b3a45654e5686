//! Identifier types for change log entries
//!
//! Entry ids are UUIDv7, so they sort by creation time when compared as
//! strings. Backends rely on this to break ties between entries written
//! within the same timestamp tick.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single change log entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Generate a new time-ordered EntryId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for rows read back from storage)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
