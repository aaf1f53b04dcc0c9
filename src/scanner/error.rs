//! Scanner Error Types

use thiserror::Error;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur during an inventory scan
///
/// A failed tick is logged and skipped; nothing here stops the scheduler.
#[derive(Debug, Error, Clone)]
pub enum ScanError {
    /// The inventory collaborator could not be read
    #[error("inventory unavailable: {message}")]
    InventoryUnavailable { message: String },

    /// Scan configuration is unusable
    #[error("invalid scan configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Create an inventory-unavailable error
    pub fn inventory_unavailable(message: impl Into<String>) -> Self {
        Self::InventoryUnavailable {
            message: message.into(),
        }
    }

    /// Create an invalid-config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
