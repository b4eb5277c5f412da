//! Process-wide tracing setup shared by the binaries.

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Initialize process-wide observability (JSON logs, `RUST_LOG` filter).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init("info");
}

/// Human-readable logs for interactive tools (the admin CLI).
pub fn init_compact() {
    tracing::init_compact("warn");
}
