//! Application configuration
//!
//! TOML configuration with a small discovery hierarchy and typed accessors.
//! Sections: `[alerts]` (store capacity, duplicate window), `[scanner]`
//! (interval, thresholds) and `[logging]`. CLI flags override file values;
//! the merge happens in the binary.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use toml::Value;

use crate::scanner::ScanConfig;

/// Configuration storage - section_name -> key -> value
pub type Configuration = HashMap<String, HashMap<String, String>>;

/// Default config file looked up next to the working directory
const DEFAULT_CONFIG_FILE: &str = "shopwatch.toml";

/// Configuration manager
pub struct ConfigManager {
    config: Configuration,
    source_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a ConfigManager from an in-memory Configuration (tests)
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config,
            source_path: None,
        }
    }

    /// Load configuration: an explicit path if given, else
    /// `./shopwatch.toml` if present, else empty configuration.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load_from_file(path.to_path_buf());
        }

        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::load_from_file(default_path);
        }

        debug!("no configuration file found, using defaults");
        Ok(Self {
            config: Configuration::new(),
            source_path: None,
        })
    }

    /// Load configuration from an explicit file path
    pub fn load_from_file(path: PathBuf) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config = parse_toml_config(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        info!("loaded configuration from: {}", path.display());
        Ok(Self {
            config,
            source_path: Some(path),
        })
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Raw value lookup
    pub fn get_value(&self, section: &str, key: &str) -> Option<&String> {
        self.config.get(section).and_then(|s| s.get(key))
    }

    pub fn get_usize(&self, section: &str, key: &str) -> Result<Option<usize>> {
        self.parse_value(section, key)
    }

    pub fn get_u32(&self, section: &str, key: &str) -> Result<Option<u32>> {
        self.parse_value(section, key)
    }

    pub fn get_i64(&self, section: &str, key: &str) -> Result<Option<i64>> {
        self.parse_value(section, key)
    }

    /// Seconds value converted to a Duration
    pub fn get_duration_secs(&self, section: &str, key: &str) -> Result<Option<Duration>> {
        Ok(self
            .parse_value::<u64>(section, key)?
            .map(Duration::from_secs))
    }

    pub fn get_log_level(&self, section: &str, key: &str) -> Result<Option<log::LevelFilter>> {
        match self.get_value(section, key) {
            Some(value) => Ok(Some(crate::logging::parse_log_level(value)?)),
            None => Ok(None),
        }
    }

    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_value(section, key).map(PathBuf::from)
    }

    fn parse_value<T>(&self, section: &str, key: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get_value(section, key) {
            Some(value) => {
                let parsed = value.parse::<T>().with_context(|| {
                    format!("invalid value for {}.{}: {}", section, key, value)
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Store capacity from `[alerts] capacity`
    pub fn alert_capacity(&self) -> Result<Option<usize>> {
        self.get_usize("alerts", "capacity")
    }

    /// Duplicate-suppression window from `[alerts] duplicate-window-secs`
    pub fn duplicate_window(&self) -> Result<Option<Duration>> {
        self.get_duration_secs("alerts", "duplicate-window-secs")
    }

    /// Scanner configuration from the `[scanner]` section, starting from
    /// defaults
    pub fn scan_config(&self) -> Result<ScanConfig> {
        let mut config = ScanConfig::default();

        if let Some(interval) = self.get_duration_secs("scanner", "interval-secs")? {
            config.interval = interval;
        }
        if let Some(threshold) = self.get_u32("scanner", "low-stock-threshold")? {
            config.low_stock_threshold = threshold;
        }
        if let Some(days) = self.get_i64("scanner", "expiry-warning-days")? {
            config.expiry_warning_days = days;
        }

        Ok(config)
    }
}

/// Parse TOML content into section/key/value form. Top-level tables become
/// sections; top-level scalars land in the "base" section.
pub fn parse_toml_config(content: &str) -> Result<Configuration> {
    let parsed: Value = content.parse().context("invalid TOML")?;
    let mut config = Configuration::new();

    if let Value::Table(table) = parsed {
        for (section_name, section_value) in table {
            match section_value {
                Value::Table(section_table) => {
                    let section = config.entry(section_name).or_default();
                    for (key, value) in section_table {
                        section.insert(key, value_to_string(&value));
                    }
                }
                other => {
                    config
                        .entry("base".to_string())
                        .or_default()
                        .insert(section_name, value_to_string(&other));
                }
            }
        }
    }

    Ok(config)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
