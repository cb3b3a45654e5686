//! Checksums for migrations
//!
//! Computes SHA256 checksums of migration SQL so edits to an applied
//! migration are detected

use kronos_core::digest::hash_string;

/// Compute SHA256 checksum of migration SQL
pub fn compute_checksum(content: &str) -> String {
    hash_string(content)
}
