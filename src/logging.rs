//! Logging setup
//!
//! `log`-facade logger with text or JSON line output, writing to the
//! console, a file, or both, with independent levels per destination.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use log::{Level, LevelFilter};
use serde::Serialize;

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}. Valid options: text, json", s)),
        }
    }
}

/// Log destination options
#[derive(Debug, Clone, PartialEq)]
pub enum LogDestination {
    Console,
    File(PathBuf),
    Both(PathBuf),
}

/// One JSON log line
#[derive(Debug, Serialize)]
struct JsonLogEntry<'a> {
    timestamp: String,
    level: String,
    message: &'a str,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_level: LevelFilter,
    pub file_level: Option<LevelFilter>,
    pub format: LogFormat,
    pub destination: LogDestination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            file_level: None,
            format: LogFormat::Text,
            destination: LogDestination::Console,
        }
    }
}

struct AppLogger {
    config: LogConfig,
}

impl AppLogger {
    fn format_message(&self, level: Level, message: &str) -> String {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        match self.config.format {
            LogFormat::Text => {
                format!("{} [{}] {}", timestamp, level.to_string().to_uppercase(), message)
            }
            LogFormat::Json => {
                let entry = JsonLogEntry {
                    timestamp,
                    level: level.to_string().to_uppercase(),
                    message,
                };
                serde_json::to_string(&entry).unwrap_or_else(|_| message.to_string())
            }
        }
    }

    fn console_enabled(&self, level: Level) -> bool {
        matches!(
            self.config.destination,
            LogDestination::Console | LogDestination::Both(_)
        ) && level <= self.config.console_level
    }

    fn file_enabled(&self, level: Level) -> bool {
        matches!(
            self.config.destination,
            LogDestination::File(_) | LogDestination::Both(_)
        ) && level <= self.config.file_level.unwrap_or(self.config.console_level)
    }

    fn file_path(&self) -> Option<&PathBuf> {
        match &self.config.destination {
            LogDestination::Console => None,
            LogDestination::File(path) | LogDestination::Both(path) => Some(path),
        }
    }

    fn write_to_file(&self, formatted: &str, path: &PathBuf) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{}", formatted));
        if let Err(error) = result {
            eprintln!("log file write failed ({}): {}", path.display(), error);
        }
    }
}

impl log::Log for AppLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.console_enabled(metadata.level()) || self.file_enabled(metadata.level())
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let formatted = self.format_message(record.level(), &record.args().to_string());
        if self.console_enabled(record.level()) {
            let _ = writeln!(io::stderr(), "{}", formatted);
        }
        if self.file_enabled(record.level()) {
            if let Some(path) = self.file_path() {
                self.write_to_file(&formatted, path);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Initialize the global logger
pub fn init_logger(config: LogConfig) -> Result<()> {
    let max_level = config
        .file_level
        .map_or(config.console_level, |file_level| {
            file_level.max(config.console_level)
        });

    log::set_boxed_logger(Box::new(AppLogger { config }))
        .context("failed to set global logger")?;
    log::set_max_level(max_level);
    Ok(())
}

/// Convert a level name to a LevelFilter
pub fn parse_log_level(level: &str) -> Result<LevelFilter> {
    match level.to_lowercase().as_str() {
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        "off" => Ok(LevelFilter::Off),
        _ => Err(anyhow::anyhow!(
            "Invalid log level: {}. Valid levels: error, warn, info, debug, trace, off",
            level
        )),
    }
}
