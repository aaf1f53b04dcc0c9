//! Broadcast Hub
//!
//! Fans feed events out to every connected observer with best-effort,
//! fire-and-forget semantics. Each subscriber gets its own bounded channel;
//! delivery uses `try_send`, so a slow observer loses events instead of
//! stalling the mutation path or the other observers. There is no backlog
//! for disconnected observers; reconnecting means subscribing again and
//! receiving a fresh snapshot.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::alerts::error::{AlertError, AlertResult};
use crate::alerts::events::FeedEvent;
use crate::alerts::record::Notification;

/// Default per-subscriber channel capacity
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Identifier for a live subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-subscriber delivery channel
struct SubscriberHandle {
    sender: mpsc::Sender<FeedEvent>,
}

/// Aggregate delivery statistics
#[derive(Debug, Clone, Default)]
pub struct DeliveryStats {
    /// Events handed to the hub for broadcast
    pub events_published: u64,
    /// Per-subscriber deliveries that succeeded
    pub events_delivered: u64,
    /// Per-subscriber deliveries dropped because the channel was full
    pub events_dropped: u64,
    /// Subscribers removed after their channel closed
    pub subscribers_disconnected: u64,
}

/// Publish/subscribe fan-out for the notification feed
pub struct BroadcastHub {
    subscribers: Arc<RwLock<HashMap<SubscriberId, SubscriberHandle>>>,
    stats: Arc<RwLock<DeliveryStats>>,
    channel_capacity: usize,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::with_channel_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_channel_capacity(channel_capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(DeliveryStats::default())),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Register a new observer. The returned stream yields the given
    /// snapshot as its first event, then live create/update events.
    pub async fn subscribe(
        &self,
        snapshot: Vec<Notification>,
    ) -> (SubscriberId, ReceiverStream<FeedEvent>) {
        let id = SubscriberId::generate();
        let (sender, receiver) = mpsc::channel(self.channel_capacity);

        // Fresh channel, always has room for the snapshot
        let _ = sender.try_send(FeedEvent::snapshot(snapshot));

        let mut subscribers = self.subscribers.write().await;
        subscribers.insert(id, SubscriberHandle { sender });
        debug!("subscriber {} connected ({} total)", id, subscribers.len());

        (id, ReceiverStream::new(receiver))
    }

    /// Remove an observer. Dropping the stream has the same effect; the hub
    /// reaps closed channels on the next broadcast.
    pub async fn unsubscribe(&self, id: SubscriberId) -> AlertResult<()> {
        let mut subscribers = self.subscribers.write().await;
        if subscribers.remove(&id).is_some() {
            debug!("subscriber {} disconnected ({} total)", id, subscribers.len());
            Ok(())
        } else {
            Err(AlertError::subscriber_not_found(id))
        }
    }

    /// Deliver an event to every current subscriber. Never blocks: full
    /// channels drop the event for that subscriber only, closed channels
    /// remove the subscriber.
    pub async fn broadcast(&self, event: FeedEvent) {
        let mut subscribers = self.subscribers.write().await;
        let mut delivered = 0u64;
        let mut dropped = 0u64;
        let mut closed: Vec<SubscriberId> = Vec::new();

        for (id, handle) in subscribers.iter() {
            match handle.sender.try_send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                }
                Err(TrySendError::Full(_)) => {
                    dropped += 1;
                    debug!("subscriber {} is lagging, dropped event", id);
                }
                Err(TrySendError::Closed(_)) => {
                    closed.push(*id);
                }
            }
        }

        for id in &closed {
            subscribers.remove(id);
            debug!("subscriber {} channel closed, removed", id);
        }
        if dropped > 0 {
            warn!("dropped {} feed events for lagging subscribers", dropped);
        }

        let mut stats = self.stats.write().await;
        stats.events_published += 1;
        stats.events_delivered += delivered;
        stats.events_dropped += dropped;
        stats.subscribers_disconnected += closed.len() as u64;
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn stats(&self) -> DeliveryStats {
        self.stats.read().await.clone()
    }

    /// Drop every subscriber, ending their streams
    pub async fn shutdown(&self) {
        let mut subscribers = self.subscribers.write().await;
        let count = subscribers.len();
        subscribers.clear();
        debug!("broadcast hub shut down ({} subscribers removed)", count);
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for BroadcastHub {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
            stats: Arc::clone(&self.stats),
            channel_capacity: self.channel_capacity,
        }
    }
}
