//! Error handling for kronos-store
//!
//! Maps backend failures onto the core `KronosError` taxonomy

use kronos_core::errors::KronosError;

/// Result type alias using KronosError
pub use kronos_core::errors::Result;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> KronosError {
    KronosError::ChangeLog {
        op: "migration".to_string(),
        message: format!("Migration {} failed: {}", migration_id, reason),
    }
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> KronosError {
    KronosError::ChangeLog {
        op: "migration_checksum".to_string(),
        message: format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ),
    }
}

/// Create a change log error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> KronosError {
    KronosError::ChangeLog {
        op: "sqlite".to_string(),
        message: err.to_string(),
    }
}

/// Create a snapshot store IO error
pub fn io_error(operation: &str, err: std::io::Error) -> KronosError {
    KronosError::Store {
        op: operation.to_string(),
        message: err.to_string(),
    }
}

/// Create a corrupt row error for values that fail to decode
pub fn corrupt_row(column: &str, reason: impl std::fmt::Display) -> KronosError {
    KronosError::ChangeLog {
        op: "decode_row".to_string(),
        message: format!("Column {} could not be decoded: {}", column, reason),
    }
}
