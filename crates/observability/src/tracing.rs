//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with("info", true);
}

/// Initialize with an explicit default filter and output format.
///
/// `RUST_LOG` still wins over `default_filter` when set.
pub fn init_with(default_filter: &str, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter_or(default_filter))
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.pretty().try_init()
    };
}

/// Compact output routed through the test harness's captured writer.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_or("debug"))
        .with_test_writer()
        .with_target(false)
        .try_init();
}
