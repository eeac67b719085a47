//! CLI command implementations

pub mod diff;
pub mod logs;
pub mod parse;
pub mod status;
pub mod upload;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use duewatch_core::config::Config;
use duewatch_core::services::{EntryPoint, LogEvent, LoggingService};
use duewatch_core::DuewatchContext;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_duewatch_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the data directory from DUEWATCH_DIR or ~/.duewatch
pub fn get_duewatch_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DUEWATCH_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".duewatch"))
        .ok_or_else(|| anyhow!("Could not find home directory; set DUEWATCH_DIR"))
}

/// Get or create the duewatch context
pub fn get_context() -> Result<DuewatchContext> {
    let data_dir = get_duewatch_dir()?;
    DuewatchContext::new(&data_dir)
        .with_context(|| format!("Failed to open duewatch data directory {}", data_dir.display()))
}

/// Load settings without opening the snapshot store
pub fn get_config() -> Result<Config> {
    let data_dir = get_duewatch_dir()?;
    Config::load(&data_dir)
}

/// Report text from a file, or from stdin when no file is given
pub fn read_input(file: Option<&Path>) -> Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report file: {}", path.display()));
    }
    if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read report text from stdin")?;
        return Ok(buffer);
    }
    bail!("No report provided. Pass a text file or pipe the extracted text on stdin.");
}

/// Parse a `YYYY-MM-DD` command-line date
pub fn parse_date_arg(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                .with_context(|| format!("Invalid {} '{}', expected YYYY-MM-DD", name, v))
        })
        .transpose()
}
