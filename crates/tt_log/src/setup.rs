//! Function to set up logging in binaries and tests.

/// Directs [`log`] calls to stderr.
///
/// Respects `RUST_LOG`, defaulting to `info`. Safe to call more than once,
/// so tests can call it without coordinating.
pub fn setup_logging() {
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned());

    let mut stderr_logger = env_logger::Builder::new();
    stderr_logger.parse_filters(&log_filter);

    // `try_init` so that the second caller doesn't panic:
    if stderr_logger.try_init().is_ok() {
        log::set_max_level(if log_filter.contains("trace") {
            log::LevelFilter::Trace
        } else if log_filter.contains("debug") {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        });
    }
}
