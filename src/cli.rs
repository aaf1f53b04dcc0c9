//! Command-line interface

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// Retail Operations Alerting Daemon
#[derive(Parser, Debug)]
#[command(name = "shopwatch")]
#[command(
    about = "In-memory operational alerting for a retail back office: watches inventory for low stock and approaching expiry, coalesces repeat conditions, and streams a live notification feed"
)]
#[command(version)]
pub struct Args {
    /// Inventory TOML file to watch
    #[arg(short = 'i', long = "inventory", value_name = "FILE")]
    pub inventory: Option<PathBuf>,

    /// Run a single scan and print the resulting feed, then exit
    #[arg(long)]
    pub once: bool,

    /// Seconds between inventory scans
    #[arg(long = "scan-interval", value_name = "SECS")]
    pub scan_interval: Option<u64>,

    /// Stock level at or below which a low-stock alert is raised
    #[arg(long = "low-stock-threshold", value_name = "N")]
    pub low_stock_threshold: Option<u32>,

    /// Days before expiry at which a warning is raised
    #[arg(long = "expiry-warning-days", value_name = "DAYS")]
    pub expiry_warning_days: Option<i64>,

    /// Maximum number of notification records kept in memory
    #[arg(long = "capacity", value_name = "N")]
    pub capacity: Option<usize>,

    /// Verbose output (debug level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    Args::parse()
}

/// Validate flag combinations
pub fn validate_args(args: &Args) -> Result<()> {
    let log_selectors = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();
    if log_selectors > 1 {
        anyhow::bail!("only one of --verbose, --quiet, --debug may be given");
    }

    if args.log_file_level.is_some() && args.log_file.is_none() {
        anyhow::bail!("--log-file-level requires --log-file");
    }

    if let Some(interval) = args.scan_interval {
        if interval == 0 {
            anyhow::bail!("--scan-interval must be at least 1 second");
        }
    }

    if let Some(capacity) = args.capacity {
        if capacity == 0 {
            anyhow::bail!("--capacity must be at least 1");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_from(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_args_are_valid() {
        let args = args_from(&["shopwatch"]);
        assert!(validate_args(&args).is_ok());
        assert!(!args.once);
        assert!(args.inventory.is_none());
    }

    #[test]
    fn test_scanner_overrides() {
        let args = args_from(&[
            "shopwatch",
            "--inventory",
            "stock.toml",
            "--scan-interval",
            "60",
            "--low-stock-threshold",
            "3",
        ]);
        assert!(validate_args(&args).is_ok());
        assert_eq!(args.scan_interval, Some(60));
        assert_eq!(args.low_stock_threshold, Some(3));
        assert_eq!(args.inventory, Some(PathBuf::from("stock.toml")));
    }

    #[test]
    fn test_conflicting_log_flags_rejected() {
        let args = args_from(&["shopwatch", "--verbose", "--quiet"]);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_file_level_requires_file() {
        let args = args_from(&["shopwatch", "--log-file-level", "debug"]);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let args = args_from(&["shopwatch", "--scan-interval", "0"]);
        assert!(validate_args(&args).is_err());
    }
}
