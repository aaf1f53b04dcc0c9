//! Notification Alert Engine
//!
//! In-memory alerting core for the back office: a bounded notification
//! store, a resolver that deduplicates and coalesces detected conditions,
//! a broadcast hub that fans feed events out to live observers, and the
//! client API tying them together.
//!
//! # Architecture
//!
//! - **Record**: the notification value type with a typed per-kind payload
//! - **Store**: bounded collection with capacity-based eviction
//! - **Resolver**: create / coalesce / suppress / clear decisions
//! - **Hub**: snapshot-on-subscribe pub/sub fan-out
//! - **Service**: the client API external callers and observers use
//!
//! State is process-local only: a restart clears all notification history.

pub mod error;
pub mod events;
pub mod hub;
pub mod record;
pub mod resolver;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use error::{AlertError, AlertResult};
pub use events::FeedEvent;
pub use hub::{BroadcastHub, DeliveryStats, SubscriberId};
pub use record::{Notification, NotificationData, NotificationId, NotificationKind, SubjectKey};
pub use resolver::{ClearOutcome, EmitOutcome, EmitRequest};
pub use service::{EmailRecipient, FeedCounts, FeedFilter, NotificationService};
pub use store::NotificationStore;
