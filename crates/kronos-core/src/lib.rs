//! Kronos Core - entity change tracking kernel
//!
//! This crate provides:
//! - The canonical value model (`Value`, `CanonicalView`)
//! - Entity normalization with per-type adapters and opt-in reflection
//! - A structural diff engine with id-correlated and multiset list diffing
//! - A snapshot tracker with conflict detection and change logging
//! - In-memory snapshot store and change log, behind replaceable traits
//! - Log-safe rendering, content digests, configuration and logging

pub mod change_log;
pub mod config;
pub mod diff;
pub mod digest;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod normalize;
pub mod render;
pub mod repository;
pub mod store;
pub mod tracker;

// Referenced by the exported logging macros.
pub use kronos_core_types;

// Re-export commonly used types
pub use change_log::{
    ChangeEvent, ChangeKind, ChangeLogger, HistoryOrder, HistoryQuery, LogEntry, MemoryChangeLog,
};
pub use config::TrackerConfig;
pub use diff::{Change, ChangeKey, Diff, DiffEngine, Update};
pub use errors::{ExError, ExErrorKind, KronosError, Result};
pub use model::{CanonicalView, Metadata, Value};
pub use normalize::{
    AdapterTarget, Attribute, Entity, EntityAdapter, EntityNormalizer, Record,
};
pub use repository::{EntityRepository, TrackedRepository};
pub use store::{MemorySnapshotStore, SnapshotStore};
pub use tracker::Tracker;
