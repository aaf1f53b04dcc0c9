//! Notification Client API
//!
//! `NotificationService` is the single entry point for everything outside
//! the engine: business code emits purchase/credit events, the condition
//! scanner emits and clears stock/expiry conditions, and observers list,
//! subscribe and mark records. All store mutations run behind one async
//! mutex (the engine's single logical writer domain), and feed events are
//! broadcast while the lock is still held so every subscriber sees events
//! in store order. Broadcasting never blocks, so holding the lock across it
//! is cheap.

use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_stream::wrappers::ReceiverStream;

use crate::alerts::error::{AlertError, AlertResult};
use crate::alerts::events::FeedEvent;
use crate::alerts::hub::{BroadcastHub, DeliveryStats, SubscriberId};
use crate::alerts::record::{Notification, NotificationData, NotificationId, NotificationKind, SubjectKey};
use crate::alerts::resolver::{self, ClearOutcome, EmitOutcome, EmitRequest};
use crate::alerts::store::NotificationStore;
use crate::email::EmailTransport;

/// Which records a list call returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFilter {
    All,
    Unread,
    Unresolved,
}

/// Unread/unresolved totals for badge rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCounts {
    pub unread: usize,
    pub unresolved: usize,
}

/// Optional email target for an emission
#[derive(Debug, Clone)]
pub struct EmailRecipient {
    pub address: String,
    pub name: String,
}

impl EmailRecipient {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

/// The notification engine's client API
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<Mutex<NotificationStore>>,
    hub: BroadcastHub,
    mailer: Arc<dyn EmailTransport>,
}

impl NotificationService {
    /// Create a service with a default store and hub
    pub fn new(mailer: Arc<dyn EmailTransport>) -> Self {
        Self::with_store(NotificationStore::new(), mailer)
    }

    /// Create a service around a preconfigured store
    pub fn with_store(store: NotificationStore, mailer: Arc<dyn EmailTransport>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            hub: BroadcastHub::new(),
            mailer,
        }
    }

    /// Emit a notification for a detected condition or business event.
    ///
    /// Burst duplicates are absorbed silently; an active record for the
    /// same subject is coalesced and re-broadcast as an update; otherwise a
    /// new record is created and broadcast. When a recipient is given the
    /// email side-channel fires asynchronously; delivery failure is logged
    /// and swallowed, never unwinding the store mutation.
    pub async fn emit(
        &self,
        request: EmitRequest,
        email: Option<EmailRecipient>,
    ) -> Notification {
        let outcome = {
            let mut store = self.store.lock().await;
            let outcome = resolver::emit(&mut store, request);
            match &outcome {
                EmitOutcome::Suppressed(record) => {
                    debug!("duplicate emission absorbed by {}", record.id);
                }
                EmitOutcome::Coalesced(record) => {
                    self.hub.broadcast(FeedEvent::updated(record.clone())).await;
                }
                EmitOutcome::Created(record) => {
                    self.hub.broadcast(FeedEvent::created(record.clone())).await;
                }
            }
            outcome
        };

        if outcome.mutated() {
            if let Some(recipient) = email {
                self.dispatch_email(recipient, outcome.notification());
            }
        }
        outcome.into_notification()
    }

    /// Resolve the active record for a subject and append the terminal
    /// record describing the resolution. Returns the terminal record, or
    /// `None` when the subject had no active record.
    ///
    /// `data` is the terminal record's payload; `None` reuses the frozen
    /// record's payload.
    pub async fn clear(
        &self,
        kind: NotificationKind,
        subject: &SubjectKey,
        title: impl Into<String>,
        message: impl Into<String>,
        data: Option<NotificationData>,
    ) -> Option<Notification> {
        let mut store = self.store.lock().await;
        match resolver::clear(&mut store, kind, subject, title, message, data) {
            ClearOutcome::NoActive => None,
            ClearOutcome::Cleared { frozen, terminal } => {
                self.hub.broadcast(FeedEvent::updated(frozen)).await;
                self.hub
                    .broadcast(FeedEvent::created(terminal.clone()))
                    .await;
                Some(terminal)
            }
        }
    }

    /// Ordered read view of the store
    pub async fn list(&self, filter: FeedFilter) -> Vec<Notification> {
        let store = self.store.lock().await;
        match filter {
            FeedFilter::All => store.list_all(),
            FeedFilter::Unread => store.list_unread(),
            FeedFilter::Unresolved => store.list_unresolved(),
        }
    }

    pub async fn counts(&self) -> FeedCounts {
        let store = self.store.lock().await;
        FeedCounts {
            unread: store.unread_count(),
            unresolved: store.unresolved_count(),
        }
    }

    pub async fn get(&self, id: NotificationId) -> Option<Notification> {
        self.store.lock().await.get(id).cloned()
    }

    /// Mark a record read and redistribute it to every observer (the
    /// requester included, as confirmation). Returns false for an unknown
    /// id. Repeat calls succeed without broadcasting again.
    pub async fn mark_read(&self, id: NotificationId) -> bool {
        let mut store = self.store.lock().await;
        match store.mark_read(id) {
            Ok((record, changed)) => {
                if changed {
                    self.hub.broadcast(FeedEvent::updated(record)).await;
                }
                true
            }
            Err(AlertError::NotFound { .. }) => {
                debug!("mark_read: notification {} not found", id);
                false
            }
            Err(error) => {
                warn!("mark_read failed: {}", error);
                false
            }
        }
    }

    /// Explicitly resolve a record. `resolved` is one-way: passing `false`
    /// never un-resolves and is an idempotent success. Returns false for an
    /// unknown id.
    pub async fn mark_resolved(&self, id: NotificationId, value: bool) -> bool {
        let mut store = self.store.lock().await;
        match store.mark_resolved(id, value) {
            Ok((record, changed)) => {
                if changed {
                    self.hub.broadcast(FeedEvent::updated(record)).await;
                }
                true
            }
            Err(AlertError::NotFound { .. }) => {
                debug!("mark_resolved: notification {} not found", id);
                false
            }
            Err(error) => {
                warn!("mark_resolved failed: {}", error);
                false
            }
        }
    }

    /// Open a live feed subscription. The stream's first event is a
    /// snapshot consistent with subsequent events: the store lock is held
    /// across registration, so nothing can slip between snapshot and live
    /// delivery.
    pub async fn subscribe(&self) -> (SubscriberId, ReceiverStream<FeedEvent>) {
        let store = self.store.lock().await;
        self.hub.subscribe(store.list_all()).await
    }

    pub async fn unsubscribe(&self, id: SubscriberId) -> AlertResult<()> {
        self.hub.unsubscribe(id).await
    }

    pub async fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count().await
    }

    pub async fn delivery_stats(&self) -> DeliveryStats {
        self.hub.stats().await
    }

    /// Close all subscriptions
    pub async fn shutdown(&self) {
        self.hub.shutdown().await;
    }

    fn dispatch_email(&self, recipient: EmailRecipient, record: &Notification) {
        let mailer = Arc::clone(&self.mailer);
        let subject = record.title.clone();
        let message = record.message.clone();
        tokio::spawn(async move {
            if let Err(error) = mailer
                .send_notification_email(&recipient.address, &recipient.name, &subject, &message)
                .await
            {
                warn!("notification email failed: {}", error);
            }
        });
    }
}
