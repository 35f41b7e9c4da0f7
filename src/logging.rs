use crate::wr3223::frame::humanize;
use log::{debug, error, info, log_enabled, Level};

/// Initializes the logger with the `env_logger` crate.
///
/// Verbosity follows `RUST_LOG`; `RUST_LOG=wr3223::frame=debug` shows every
/// frame on the line.
pub fn init_logger() {
    env_logger::init();
}

/// Like [`init_logger`], but falls back to `default_filter` when `RUST_LOG`
/// is unset. Safe to call more than once.
pub fn init_logger_with_default(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Logs an error message.
pub fn log_error(message: &str) {
    if log_enabled!(Level::Error) {
        error!("{message}");
    }
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}

/// Logs a frame at debug level, both humanized and as hex.
pub fn log_frame(direction: &str, data: &[u8]) {
    const MAX_LOG_BYTES: usize = 64;

    if !log_enabled!(target: "wr3223::frame", Level::Debug) {
        return;
    }
    let shown = &data[..data.len().min(MAX_LOG_BYTES)];
    let suffix = if data.len() > MAX_LOG_BYTES {
        format!(" ... ({} bytes total)", data.len())
    } else {
        String::new()
    };
    debug!(
        target: "wr3223::frame",
        "{direction} {} [{}]{suffix}",
        humanize(shown),
        hex::encode(shown)
    );
}
