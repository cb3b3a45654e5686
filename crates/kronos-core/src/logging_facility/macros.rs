//! Operation boundary macros
//!
//! Every tracked operation emits one `start` event and then exactly one of
//! `end` or `end_error`, all carrying the same `op`. Extra `tracing` fields
//! may follow the required ones.

/// Log the start of an operation
///
/// ```
/// # use kronos_core::log_op_start;
/// log_op_start!("track_entity");
/// log_op_start!("track_entity", entity_type = "User", overwrite = false);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::kronos_core_types::schema::EVENT_START,
            $($($field)*)?
        )
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use kronos_core::log_op_end;
/// log_op_end!("log_changes", duration_ms = 3, entity_key = "User-1", changes = 2);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::kronos_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)*)?
        )
    };
}

/// Log the failed end of an operation
///
/// The error is taken by value and converted into an `ExError`, whose kind
/// and stable code are attached to the event.
///
/// ```
/// # use kronos_core::{log_op_error, errors::KronosError};
/// let err = KronosError::Conflict { entity_key: "User-1".to_string() };
/// log_op_error!("track_entity", err, duration_ms = 10, entity_type = "User");
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::kronos_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            $($($field)*)?
        )
    }};
}
