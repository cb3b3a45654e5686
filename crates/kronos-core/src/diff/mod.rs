//! Structural diffing of canonical views.

pub mod engine;
pub mod model;

pub use engine::{DiffEngine, DEFAULT_IDENTITY_FIELD};
pub use model::{Change, ChangeKey, Diff, Update};
