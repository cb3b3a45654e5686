//! Persistent change log backed by SQLite

mod sqlite_log;

pub use sqlite_log::SqliteChangeLog;
