//! Logging setup for the swerve executables
//!
//! All records go to stdout and to `{exec_name}.log` in the session
//! directory. Records from the autonomous scheduler are additionally copied
//! into `auto.log` so a routine can be reviewed without the drive control
//! chatter around it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use thiserror::Error;

use crate::session::{self, Session};

pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target prefix of the autonomous scheduler and its commands.
pub const AUTO_TARGET: &str = "swerve_lib::auto";

/// Target of the periodic ticker, which is capped at `DEBUG`.
const TICK_TARGET: &str = "swerve_lib::tick";

/// Name of the autonomous log file within the session directory.
const AUTO_LOG_FILE: &str = "auto.log";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Could not open log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("Could not install the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` must be `INFO` or more verbose, warnings from the drive
/// control are not allowed to be hidden. Must only be called once per
/// process.
pub fn logger_init(
    min_level: LevelFilter,
    session: &Session
) -> Result<(), LoggerInitError> {

    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let main_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;
    let auto_path = session.session_root.join(AUTO_LOG_FILE);
    let auto_file = fern::log_file(&auto_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let auto_dispatch = fern::Dispatch::new()
        .filter(|meta| is_auto_target(meta.target()))
        .chain(auto_file);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", format_record(record, message)))
        })
        .level(min_level)
        .level_for(TICK_TARGET, min_level.min(LevelFilter::Debug))
        .chain(std::io::stdout())
        .chain(main_file)
        .chain(auto_dispatch)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised at {:?}", min_level);
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Main log: {:?}", session.log_file_path);
    info!("    Auto log: {:?}", auto_path);

    Ok(())
}

/// True if records from `target` belong in the autonomous log.
pub fn is_auto_target(target: &str) -> bool {
    target.starts_with(AUTO_TARGET)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Format a record as `[elapsed LVL] message`. Debug and trace records also
/// carry their target.
fn format_record(record: &Record, message: &std::fmt::Arguments) -> String {
    let elapsed_s = session::get_elapsed_seconds();
    let level = level_tag(record.level());

    if record.level() > Level::Info {
        format!("[{:10.6} {}] {}: {}", elapsed_s, level, record.target(), message)
    }
    else {
        format!("[{:10.6} {}] {}", elapsed_s, level, message)
    }
}

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info  => "INF".normal(),
        Level::Warn  => "WRN".yellow(),
        Level::Error => "ERR".red().bold()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_auto_target() {
        assert!(is_auto_target("swerve_lib::auto"));
        assert!(is_auto_target("swerve_lib::auto::commands::navigate"));
        assert!(!is_auto_target("swerve_lib::swerve_ctrl::state"));
        assert!(!is_auto_target("swerve_exec"));
    }
}
