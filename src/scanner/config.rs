//! Scanner Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scanner::error::{ScanError, ScanResult};

/// Default time between inventory scans
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Stock level at or below which a low-stock condition is raised
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

/// Days before expiry at which an expiry warning is raised
pub const DEFAULT_EXPIRY_WARNING_DAYS: i64 = 14;

/// Condition scanner parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Time between scans. One scan also runs at startup.
    pub interval: Duration,
    /// Inclusive low-stock threshold
    pub low_stock_threshold: u32,
    /// Expiry warning window in days (0 = warn only on the expiry day)
    pub expiry_warning_days: i64,
}

impl ScanConfig {
    pub fn validate(&self) -> ScanResult<()> {
        if self.interval.is_zero() {
            return Err(ScanError::invalid_config("scan interval must be non-zero"));
        }
        if self.expiry_warning_days < 0 {
            return Err(ScanError::invalid_config(
                "expiry warning days cannot be negative",
            ));
        }
        Ok(())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SCAN_INTERVAL,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            expiry_warning_days: DEFAULT_EXPIRY_WARNING_DAYS,
        }
    }
}
