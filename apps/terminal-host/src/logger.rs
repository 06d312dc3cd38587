//! Logging for the terminal host.
//!
//! Provides dual output (colored stdout for an operator watching the host, plain
//! `terminal-host.log` for later inspection) with thread-safe, once-per-process
//! initialization. The socket library logs through the `log` facade, so its
//! connection and routing events land in the same two outputs.

use crate::error::HostError;

use common::ErrorLocation;

use std::io::stdout;
use std::panic::Location;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

/// Runs the global logger installation exactly once.
static INIT_LOGGER_ONCE: Once = Once::new();

/// Set by the first `initialize` call, successful or not.
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

/// Log file created inside the log directory.
pub const LOG_FILE_NAME: &str = "terminal-host.log";

/// Warning logged when `initialize` is called again.
const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

/// Debug builds also log per-frame drops and handshake details.
#[cfg(debug_assertions)]
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

/// Release builds log connections, bindings and failures.
#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Install the global logger writing to stdout and `{log_dir}/terminal-host.log`.
///
/// Safe to call more than once: later calls log a warning and return `Ok`.
/// Only the first call's `log_dir` is used.
///
/// # Arguments
///
/// * `log_dir` - Existing directory that will hold the log file
///
/// # Errors
///
/// Returns [`HostError::Host`] if:
/// - The log file cannot be created in `log_dir`
/// - Another global logger is already installed
pub fn initialize(log_dir: &Path) -> Result<(), HostError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = dispatch(log_dir).and_then(|dispatch| {
            dispatch.apply().map_err(|e| HostError::Host {
                message: format!("Failed to initialize logger: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })
        });
        if result.is_ok() {
            info!("Logger initialized with level: {LOG_LEVEL:?}");
        }
    });

    result
}

/// Build the stdout + file dispatch without installing it.
///
/// Stdout lines carry the log target (`socket_core::socket::server`, ...) so an
/// operator can tell loop events from host events; file lines carry the
/// source position instead.
#[track_caller]
pub(crate) fn dispatch(log_dir: &Path) -> Result<Dispatch, HostError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);

    // Colors for stdout only
    let color_configuration = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{target}]",
                date = format_rfc3339(SystemTime::now()),
                level = color_configuration.color(record.level()),
                target = record.target(),
            ))
        })
        .chain(stdout());

    let log_file = fern::log_file(&log_file_path).map_err(|e| HostError::Host {
        message: format!("Failed to create log file {}: {e}", log_file_path.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let file_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = record.level(),
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0)
            ))
        })
        .chain(log_file);

    // Both outputs share one level filter
    Ok(Dispatch::new()
        .level(LOG_LEVEL)
        .chain(stdout_dispatch)
        .chain(file_dispatch))
}
