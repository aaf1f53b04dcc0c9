//! Notification Record Types
//!
//! The value type that flows through the whole alerting engine, plus the
//! typed payload union it carries. Each payload variant knows the business
//! subject it coalesces under, so deduplication never has to inspect an
//! open-ended map.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque unique identifier for a notification record.
///
/// Backed by UUIDv7 so ids are time-ordered and collision-free within the
/// store's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    /// Generate a fresh id
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Closed set of notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Purchase,
    CreditLimitUpdate,
    CreditPayment,
    LowStock,
    ExpiryWarning,
}

impl NotificationKind {
    /// Wire name for the kind, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Purchase => "purchase",
            NotificationKind::CreditLimitUpdate => "credit_limit_update",
            NotificationKind::CreditPayment => "credit_payment",
            NotificationKind::LowStock => "low_stock",
            NotificationKind::ExpiryWarning => "expiry_warning",
        }
    }

    /// Whether records of this kind have an active phase that a later
    /// "condition cleared" transition resolves.
    ///
    /// Purchase and credit events are informational: they are created
    /// directly in the terminal state and never cleared.
    pub fn has_lifecycle(&self) -> bool {
        matches!(
            self,
            NotificationKind::LowStock | NotificationKind::ExpiryWarning
        )
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business subject an active record coalesces under
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKey {
    Member(String),
    Product(String),
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectKey::Member(id) => write!(f, "member:{}", id),
            SubjectKey::Product(id) => write!(f, "product:{}", id),
        }
    }
}

/// Kind-specific notification payload
///
/// One variant per `NotificationKind`, each carrying its own strongly typed
/// subject key and display fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationData {
    Purchase {
        member_id: String,
        member_name: String,
        amount_cents: i64,
    },
    CreditLimitUpdate {
        member_id: String,
        member_name: String,
        new_limit_cents: i64,
    },
    CreditPayment {
        member_id: String,
        member_name: String,
        amount_cents: i64,
    },
    LowStock {
        product_id: String,
        product_name: String,
        current_stock: u32,
    },
    ExpiryWarning {
        product_id: String,
        product_name: String,
        expiry_date: NaiveDate,
    },
}

impl NotificationData {
    /// The kind this payload belongs to
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationData::Purchase { .. } => NotificationKind::Purchase,
            NotificationData::CreditLimitUpdate { .. } => NotificationKind::CreditLimitUpdate,
            NotificationData::CreditPayment { .. } => NotificationKind::CreditPayment,
            NotificationData::LowStock { .. } => NotificationKind::LowStock,
            NotificationData::ExpiryWarning { .. } => NotificationKind::ExpiryWarning,
        }
    }

    /// Subject key used for coalescing and resolution
    pub fn subject_key(&self) -> SubjectKey {
        match self {
            NotificationData::Purchase { member_id, .. }
            | NotificationData::CreditLimitUpdate { member_id, .. }
            | NotificationData::CreditPayment { member_id, .. } => {
                SubjectKey::Member(member_id.clone())
            }
            NotificationData::LowStock { product_id, .. }
            | NotificationData::ExpiryWarning { product_id, .. } => {
                SubjectKey::Product(product_id.clone())
            }
        }
    }
}

/// A single notification record
///
/// `read` and `resolved` are monotonic one-way transitions. Once `resolved`
/// is set the record is frozen: no further message, data or timestamp edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    /// Creation time, refreshed whenever the record is coalesced so it
    /// returns to the top of the feed
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub resolved: bool,
    pub data: NotificationData,
}

impl Notification {
    /// Create a new unread record. Informational kinds (no lifecycle) are
    /// created directly in the terminal state.
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        data: NotificationData,
    ) -> Self {
        let resolved = !data.kind().has_lifecycle();
        Self {
            id: NotificationId::generate(),
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
            read: false,
            resolved,
            data,
        }
    }

    /// Create a record that is terminal from the start, regardless of kind.
    /// Used for "condition cleared" records.
    pub fn new_terminal(
        title: impl Into<String>,
        message: impl Into<String>,
        data: NotificationData,
    ) -> Self {
        let mut record = Self::new(title, message, data);
        record.resolved = true;
        record
    }

    pub fn kind(&self) -> NotificationKind {
        self.data.kind()
    }

    pub fn subject_key(&self) -> SubjectKey {
        self.data.subject_key()
    }

    /// An active record is one whose underlying condition has not cleared
    pub fn is_active(&self) -> bool {
        !self.resolved
    }
}
