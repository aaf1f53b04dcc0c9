//! Email Transport Error Types

use thiserror::Error;

/// Result type for email operations
pub type EmailResult<T> = Result<T, EmailError>;

/// Errors from the outbound email collaborator
///
/// Delivery failures are logged and swallowed by the emit path; they never
/// propagate to the notification caller.
#[derive(Debug, Error, Clone)]
pub enum EmailError {
    /// The transport could not deliver the message
    #[error("email delivery to {to} failed: {reason}")]
    DeliveryFailed { to: String, reason: String },

    /// The recipient address is unusable
    #[error("invalid email recipient: {address}")]
    InvalidRecipient { address: String },
}

impl EmailError {
    /// Create a delivery-failed error
    pub fn delivery_failed(to: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            to: to.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid-recipient error
    pub fn invalid_recipient(address: impl Into<String>) -> Self {
        Self::InvalidRecipient {
            address: address.into(),
        }
    }
}
