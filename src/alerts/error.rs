//! Alert Engine Error Types

use thiserror::Error;

use crate::alerts::hub::SubscriberId;
use crate::alerts::record::NotificationId;

/// Result type for alert engine operations
pub type AlertResult<T> = Result<T, AlertError>;

/// Errors that can occur in the alert engine
///
/// None of these are fatal: `NotFound` is reported back to the caller as a
/// "not found" result at the client API boundary, and subscriber errors only
/// affect the one observer involved.
#[derive(Debug, Error, Clone)]
pub enum AlertError {
    /// No record with the given id exists in the store
    #[error("notification {id} not found")]
    NotFound { id: NotificationId },

    /// Subscriber is not registered with the broadcast hub
    #[error("subscriber {id} not found")]
    SubscriberNotFound { id: SubscriberId },
}

impl AlertError {
    /// Create a not-found error for a record id
    pub fn not_found(id: NotificationId) -> Self {
        Self::NotFound { id }
    }

    /// Create a not-found error for a subscriber id
    pub fn subscriber_not_found(id: SubscriberId) -> Self {
        Self::SubscriberNotFound { id }
    }
}
