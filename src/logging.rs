use log::{info, log_enabled, warn, Level, LevelFilter};

/// Initializes the logger with the `env_logger` crate.
///
/// Honours `RUST_LOG`; defaults to `info` when it is unset.
pub fn init_logger() {
    init_logger_with_level(LevelFilter::Info);
}

/// Initializes `env_logger` with a default level that `RUST_LOG` can override.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger_with_level(level: LevelFilter) {
    let env = env_logger::Env::default().default_filter_or(level.as_str());
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

/// Logs a warning message.
pub fn log_warn(message: &str) {
    if log_enabled!(Level::Warn) {
        warn!("{message}");
    }
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}
