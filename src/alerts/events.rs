//! Feed Event Types
//!
//! Events delivered to feed subscribers. A new subscriber first receives a
//! `Snapshot` of the whole store, then individual `Created`/`Updated` events
//! in store order.

use serde::{Deserialize, Serialize};

use crate::alerts::record::Notification;

/// An event on the live notification feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FeedEvent {
    /// Full store contents, newest first. Sent once per subscription.
    Snapshot { notifications: Vec<Notification> },

    /// A record was inserted into the store
    Created { notification: Notification },

    /// An existing record changed in place: coalesced, frozen by a clear,
    /// or its read/resolved flag flipped
    Updated { notification: Notification },
}

impl FeedEvent {
    pub fn snapshot(notifications: Vec<Notification>) -> Self {
        Self::Snapshot { notifications }
    }

    pub fn created(notification: Notification) -> Self {
        Self::Created { notification }
    }

    pub fn updated(notification: Notification) -> Self {
        Self::Updated { notification }
    }

    /// The single record this event carries, if any
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            FeedEvent::Snapshot { .. } => None,
            FeedEvent::Created { notification } | FeedEvent::Updated { notification } => {
                Some(notification)
            }
        }
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(self, FeedEvent::Snapshot { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::record::NotificationData;

    #[test]
    fn test_event_serialization() {
        let record = Notification::new(
            "Low Stock Alert",
            "Rice is running low",
            NotificationData::LowStock {
                product_id: "P1".to_string(),
                product_name: "Rice".to_string(),
                current_stock: 5,
            },
        );

        let json = serde_json::to_string(&FeedEvent::created(record)).unwrap();
        assert!(json.contains("\"event\":\"created\""));
        assert!(json.contains("\"title\":\"Low Stock Alert\""));

        let json = serde_json::to_string(&FeedEvent::snapshot(Vec::new())).unwrap();
        assert!(json.contains("\"event\":\"snapshot\""));
    }

    #[test]
    fn test_notification_accessor() {
        assert!(FeedEvent::snapshot(Vec::new()).notification().is_none());
        assert!(FeedEvent::snapshot(Vec::new()).is_snapshot());
    }
}
