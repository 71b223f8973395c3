//! Tracing and logging setup shared by ledger hosts, tests and benches.

/// Initialize process-wide tracing from `RUST_LOG` (default `info`), JSON
/// output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;
