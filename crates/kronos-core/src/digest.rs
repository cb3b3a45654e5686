//! Content digests for canonical views.
//!
//! Used as the entity id for snapshot keys when an entity declares no
//! identity of its own.
//!
//! ## Determinism Guarantees
//!
//! - Same logical content → same digest, across processes and platforms
//!   (canonical key order from `CanonicalView`, tagged value encoding)
//! - Any field or value change → different digest

use crate::errors::Result;
use crate::model::CanonicalView;
use sha2::{Digest, Sha256};

/// Compute the content digest of a view.
///
/// Returns a hex-encoded SHA256 digest (64 characters).
///
/// # Errors
///
/// Returns `KronosError::Serialization` if JSON serialization fails.
///
/// # Example
///
/// ```
/// use kronos_core::digest::compute_view_digest;
/// use kronos_core::model::CanonicalView;
///
/// let view = CanonicalView::new().with("name", "A");
/// let digest = compute_view_digest(&view).unwrap();
/// assert_eq!(digest.len(), 64);
/// ```
pub fn compute_view_digest(view: &CanonicalView) -> Result<String> {
    let canonical = serde_json::to_string(view)?;
    Ok(hash_string(&canonical))
}

/// Hash a string using SHA256.
pub fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    #[test]
    fn test_hash_string_deterministic() {
        let hash1 = hash_string("test");
        let hash2 = hash_string("test");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_digest_ignores_insertion_order() {
        let a = CanonicalView::new().with("x", 1).with("y", 2);
        let b = CanonicalView::new().with("y", 2).with("x", 1);
        assert_eq!(
            compute_view_digest(&a).unwrap(),
            compute_view_digest(&b).unwrap()
        );
    }

    #[test]
    fn test_digest_distinguishes_value_types() {
        let int = CanonicalView::new().with("x", 1);
        let string = CanonicalView::new().with("x", Value::from("1"));
        assert_ne!(
            compute_view_digest(&int).unwrap(),
            compute_view_digest(&string).unwrap()
        );
    }

    #[test]
    fn test_digest_is_pinned() {
        // Stored snapshot keys depend on this exact encoding.
        let view = CanonicalView::new().with("x", 1);
        let canonical = serde_json::to_string(&view).unwrap();
        assert_eq!(canonical, r#"{"x":{"t":"int","v":1}}"#);
        assert_eq!(compute_view_digest(&view).unwrap(), hash_string(&canonical));
    }

    #[test]
    fn test_non_finite_floats_have_distinct_digests() {
        let nan = CanonicalView::new().with("x", f64::NAN);
        let inf = CanonicalView::new().with("x", f64::INFINITY);
        let neg = CanonicalView::new().with("x", f64::NEG_INFINITY);

        let digests = [
            compute_view_digest(&nan).unwrap(),
            compute_view_digest(&inf).unwrap(),
            compute_view_digest(&neg).unwrap(),
        ];
        assert_ne!(digests[0], digests[1]);
        assert_ne!(digests[1], digests[2]);
        assert_eq!(digests[0], compute_view_digest(&nan.clone()).unwrap());
    }
}
