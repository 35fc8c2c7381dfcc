//! Logging setup shared by HouseBazaar binaries.

/// Initialize process-wide tracing with JSON output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    logging::init(logging::LogFormat::from_env());
}

/// Subscriber configuration (filters, output format).
pub mod logging;
