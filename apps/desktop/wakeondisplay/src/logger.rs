//! Logging for the WakeOnDisplay host.
//!
//! Dual output (colored stdout + plain file) with thread-safe, one-shot
//! initialization. The core only talks to the `log` facade.

use crate::error::WakeOnDisplayError;

use common::ErrorLocation;

use wake_core::scripts::SCRIPT_OUTPUT_TARGET;

use std::fs::File;
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
use log::{LevelFilter, Record, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "wakeondisplay.log";

const SCRIPT_OUTPUT_LABEL: &str = "script";

/// Level for captured script stdout (info) and stderr (warn).
const SCRIPT_OUTPUT_LEVEL: LevelFilter = LevelFilter::Info;

const LOGGER_INITIALIZED_MESSAGE_PREFIX: &str = "Logger initialized with level: ";
const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

#[cfg(debug_assertions)]
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Initialize the logger with dual output (stdout + `{log_dir}/wakeondisplay.log`).
///
/// Safe to call more than once: later calls log a warning and return `Ok`.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global logger is
/// already installed by someone else.
pub fn initialize(log_dir: &Path) -> Result<(), WakeOnDisplayError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir);
        if result.is_ok() {
            info!("{LOGGER_INITIALIZED_MESSAGE_PREFIX}{LOG_LEVEL:?}");
        }
    });

    result
}

/// Open (append) the log file inside `log_dir`.
#[track_caller]
pub(crate) fn open_log_file(log_dir: &Path) -> Result<File, WakeOnDisplayError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);

    fern::log_file(&log_file_path).map_err(|e| WakeOnDisplayError::App {
        message: format!(
            "Failed to create log file {}: {e}",
            log_file_path.display()
        ),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Where a log line came from, printed at the end of the line.
///
/// Captured script output carries the script name in its message already; the
/// supervisor's file and line would only mislead.
pub(crate) fn source_label(target: &str, file: Option<&str>, line: Option<u32>) -> String {
    if target == SCRIPT_OUTPUT_TARGET {
        return String::from(SCRIPT_OUTPUT_LABEL);
    }
    format!("{}:{}", file.unwrap_or("unknown"), line.unwrap_or(0))
}

fn source_of(record: &Record) -> String {
    source_label(record.target(), record.file(), record.line())
}

#[track_caller]
fn initialize_internal(log_dir: &Path) -> Result<(), WakeOnDisplayError> {
    let color_configuration = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    // Script output stays visible even if the core is turned down.
    let base_dispatch = Dispatch::new()
        .level(LOG_LEVEL)
        .level_for(SCRIPT_OUTPUT_TARGET, SCRIPT_OUTPUT_LEVEL)
        .level_for("sysinfo", LevelFilter::Warn);

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{source}]",
                date = format_rfc3339(SystemTime::now()),
                level = color_configuration.color(record.level()),
                source = source_of(record),
            ))
        })
        .chain(stdout());

    // Plain text, no color codes in the file
    let file_dispatch = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{source}]",
                date = format_rfc3339(SystemTime::now()),
                level = record.level(),
                source = source_of(record),
            ))
        })
        .chain(open_log_file(log_dir)?);

    base_dispatch
        .chain(stdout_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| WakeOnDisplayError::App {
            message: format!("Failed to initialize logger: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    Ok(())
}
