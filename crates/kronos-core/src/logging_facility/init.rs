//! Subscriber installation for binaries
//!
//! Tests install their own subscriber through `init_test_capture()`.

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Output format of the global subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable lines at debug level
    Development,
    /// One JSON object per event at info level
    Production,
}

impl Profile {
    fn default_directive(self) -> &'static str {
        match self {
            Profile::Development => "kronos=debug",
            Profile::Production => "kronos=info",
        }
    }
}

static INIT_ONCE: Once = Once::new();

fn env_filter(profile: Profile) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(profile.default_directive()))
}

/// Install the global subscriber, writing to stderr so command output on
/// stdout stays machine-readable.
///
/// Later calls are no-ops. `RUST_LOG` overrides the profile's default filter.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(env_filter(profile))
            .with_writer(std::io::stderr);
        let installed = match profile {
            Profile::Development => builder.finish().try_init(),
            Profile::Production => builder.json().finish().try_init(),
        };
        installed.ok();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(Profile::Production);
        init(Profile::Development);
    }

    #[test]
    fn test_profiles_scope_to_kronos_targets() {
        assert_eq!(Profile::Development.default_directive(), "kronos=debug");
        assert_eq!(Profile::Production.default_directive(), "kronos=info");
    }
}
