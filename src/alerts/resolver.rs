//! Resolver / Deduplicator
//!
//! Translates a detected condition into store mutations while enforcing the
//! two structural rules of the feed: at most one active record per
//! `(kind, subject)` pair, and identical emissions within the duplicate
//! window collapse into one record. The clear path freezes the active
//! record and appends a new terminal one, preserving per-subject history.
//!
//! These are pure functions over `&mut NotificationStore`; the caller holds
//! the store lock for the whole decision, so the check-then-mutate sequence
//! is atomic.

use chrono::Utc;
use log::debug;

use crate::alerts::record::{Notification, NotificationData, NotificationKind, SubjectKey};
use crate::alerts::store::NotificationStore;

/// A condition to turn into a notification
#[derive(Debug, Clone)]
pub struct EmitRequest {
    pub title: String,
    pub message: String,
    pub data: NotificationData,
}

impl EmitRequest {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        data: NotificationData,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            data,
        }
    }
}

/// What `emit` did with the request
#[derive(Debug, Clone)]
pub enum EmitOutcome {
    /// Burst duplicate inside the suppression window; nothing changed and
    /// nothing should be broadcast
    Suppressed(Notification),
    /// The subject's active record was refreshed in place (broadcast as an
    /// update)
    Coalesced(Notification),
    /// A new record was inserted (broadcast as a create)
    Created(Notification),
}

impl EmitOutcome {
    pub fn notification(&self) -> &Notification {
        match self {
            EmitOutcome::Suppressed(n) | EmitOutcome::Coalesced(n) | EmitOutcome::Created(n) => n,
        }
    }

    pub fn into_notification(self) -> Notification {
        match self {
            EmitOutcome::Suppressed(n) | EmitOutcome::Coalesced(n) | EmitOutcome::Created(n) => n,
        }
    }

    /// Whether the store changed (suppressed requests leave it untouched)
    pub fn mutated(&self) -> bool {
        !matches!(self, EmitOutcome::Suppressed(_))
    }
}

/// What `clear` did for the subject
#[derive(Debug, Clone)]
pub enum ClearOutcome {
    /// No active record for the subject; nothing to do
    NoActive,
    /// The active record was frozen and a terminal record appended
    Cleared {
        frozen: Notification,
        terminal: Notification,
    },
}

/// Emit a notification for a detected condition.
///
/// Order matters: duplicate suppression runs first so racing producers
/// cannot double-insert, then coalescing keeps the subject's single active
/// record fresh, and only then is a new record created.
pub fn emit(store: &mut NotificationStore, request: EmitRequest) -> EmitOutcome {
    let kind = request.data.kind();

    if let Some(existing) = store.find_recent_duplicate(kind, &request.title, &request.message) {
        debug!("suppressed duplicate {} emission: {}", kind, request.title);
        return EmitOutcome::Suppressed(existing.clone());
    }

    let subject = request.data.subject_key();
    if let Some(active) = store.find_active_by_subject_mut(kind, &subject) {
        active.message = request.message;
        active.data = request.data;
        active.timestamp = Utc::now();
        debug!("coalesced {} for {}", kind, subject);
        return EmitOutcome::Coalesced(active.clone());
    }

    let record = Notification::new(request.title, request.message, request.data);
    debug!("created {} {} for {}", kind, record.id, subject);
    store.insert(record.clone());
    EmitOutcome::Created(record)
}

/// Resolve the active record for a subject: freeze it and append a new
/// terminal record describing the resolution.
///
/// The frozen record's message is left untouched, and the terminal record is
/// resolved from the start so it never re-enters coalescing for the subject.
/// `data` is the payload for the terminal record; when `None` the frozen
/// record's payload is reused.
pub fn clear(
    store: &mut NotificationStore,
    kind: NotificationKind,
    subject: &SubjectKey,
    title: impl Into<String>,
    message: impl Into<String>,
    data: Option<NotificationData>,
) -> ClearOutcome {
    let frozen = match store.find_active_by_subject_mut(kind, subject) {
        Some(active) => {
            active.resolved = true;
            active.clone()
        }
        None => return ClearOutcome::NoActive,
    };

    let terminal = Notification::new_terminal(
        title,
        message,
        data.unwrap_or_else(|| frozen.data.clone()),
    );
    debug!("cleared {} for {}: {} -> {}", kind, subject, frozen.id, terminal.id);
    store.insert(terminal.clone());

    ClearOutcome::Cleared { frozen, terminal }
}
