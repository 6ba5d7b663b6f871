//! Process-wide logging setup for the catalog service.

/// Tracing subscriber configuration (filter, JSON formatting).
pub mod tracing;

/// Initialize structured JSON logging filtered by `RUST_LOG` (default `info`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    crate::tracing::init_with_default(crate::tracing::DEFAULT_FILTER);
}
