//! Tracing/logging initialization.
//!
//! Events are written as one JSON object per line, with the fields of the
//! enclosing `#[instrument]` span attached, so store operations can be
//! correlated with the request that triggered them.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Build the filter from `RUST_LOG`, falling back to `default`.
pub fn filter_from_env(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed (the call is then
/// a no-op).
pub fn init_with_default(default: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter_from_env(default))
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        let _ = init_with_default("debug");
        assert!(!init_with_default("debug"));
        crate::init();
    }
}
