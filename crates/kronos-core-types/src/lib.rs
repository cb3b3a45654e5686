//! Core types shared across Kronos facilities
//!
//! This crate provides foundational types used by the change log backends
//! and the logging facility:
//!
//! - **Identifiers**: EntryId for change log entries
//! - **Schema constants**: Canonical field keys and event names

pub mod ids;
pub mod schema;

pub use ids::EntryId;
