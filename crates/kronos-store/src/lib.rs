//! Kronos Store - persistent snapshot stores and change logs
//!
//! Provides:
//! - `FsSnapshotStore`: one JSON file per entity key, sharded, atomic writes
//! - `SqliteChangeLog`: change log in SQLite with embedded migrations
//! - Connection helpers and the migration runner

pub mod db;
pub mod errors;
pub mod fs;
pub mod log;
pub mod migrations;

// Re-export key types
pub use errors::Result;
pub use fs::FsSnapshotStore;
pub use log::SqliteChangeLog;
