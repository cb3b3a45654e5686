use chrono::{DateTime, TimeZone, Utc};
use kronos_core::{
    ChangeEvent, ChangeKind, EntityNormalizer, LogEntry, Metadata, Record, Tracker, TrackerConfig,
};
use kronos_store::{FsSnapshotStore, SqliteChangeLog};
use serde_json::json;
use std::path::Path;

/// Noon on the given day of March 2024
#[allow(dead_code)]
pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
}

/// Build a `User` record from a JSON object literal
#[allow(dead_code)]
pub fn user(json: serde_json::Value) -> Record {
    Record::from_json("User", json).unwrap()
}

/// An entry for `key` stamped `created_at`
#[allow(dead_code)]
pub fn entry(entity_type: &str, key: &str, kind: ChangeKind, created_at: DateTime<Utc>) -> LogEntry {
    let metadata = Metadata::new();
    let event = ChangeEvent {
        entity_type,
        entity_key: key,
        diff: None,
        kind,
        metadata: &metadata,
    };
    LogEntry::from_event(&event, created_at)
}

/// Log with `Updated` entries for "User" on days 1..=5 and one "Order" entry
#[allow(dead_code)]
pub fn seeded_log() -> SqliteChangeLog {
    let log = SqliteChangeLog::in_memory().unwrap();
    for day in 1..=5 {
        let key = format!("User-{}", day);
        log.append(&entry("User", &key, ChangeKind::Updated, at(day)))
            .unwrap();
    }
    log.append(&entry("Order", "Order-1", ChangeKind::Deleted, at(3)))
        .unwrap();
    log
}

/// Tracker persisting to `dir`, as a CLI run would build it
#[allow(dead_code)]
pub fn persistent_tracker(dir: &Path) -> Tracker<FsSnapshotStore, SqliteChangeLog> {
    Tracker::new(
        EntityNormalizer::new(TrackerConfig::default()),
        FsSnapshotStore::new(dir.join("snapshots")),
        SqliteChangeLog::open(dir.join("changes.db")).unwrap(),
    )
}

#[allow(dead_code)]
pub fn sample_metadata() -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("user".to_string(), json!("admin").into());
    metadata
}
