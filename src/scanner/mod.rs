//! Inventory Condition Scanner
//!
//! Periodic monitoring of the external inventory: low-stock detection,
//! replenishment clearing, expiry warnings and expirations. The scan is
//! read-only with respect to inventory; its only effect on the system is
//! through the notification service's emit/clear operations.

pub mod config;
pub mod error;
pub mod inventory;
pub mod monitor;

pub use config::{
    ScanConfig, DEFAULT_EXPIRY_WARNING_DAYS, DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_SCAN_INTERVAL,
};
pub use error::{ScanError, ScanResult};
pub use inventory::{InventorySource, MemoryInventory, Product};
pub use monitor::ConditionMonitor;
