//! Entity normalization.

pub mod adapter;
pub mod entity;
pub mod normalizer;

pub use adapter::{AdapterRegistry, AdapterTarget, EntityAdapter};
pub use entity::{Attribute, Entity, Record, VIEW_TYPE_NAME};
pub use normalizer::EntityNormalizer;
