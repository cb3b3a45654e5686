//! Value model shared by normalization, diffing and tracking.

pub mod value;
pub mod view;

use std::collections::BTreeMap;

pub use value::Value;
pub use view::CanonicalView;

/// Free-form metadata attached to diffs, changes and log entries.
pub type Metadata = BTreeMap<String, Value>;
