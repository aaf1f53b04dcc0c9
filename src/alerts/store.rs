//! Bounded Notification Store
//!
//! In-memory collection of notification records with a capacity-based
//! eviction policy and the ordered/filtered read views the client API
//! serves. The store itself is a plain synchronous structure; callers
//! serialize writers behind a single mutex (see `NotificationService`).

use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::alerts::error::{AlertError, AlertResult};
use crate::alerts::record::{Notification, NotificationId, NotificationKind, SubjectKey};

/// Default maximum number of records held
pub const DEFAULT_CAPACITY: usize = 100;

/// Default window within which identical emissions are absorbed
pub const DEFAULT_DUPLICATE_WINDOW: std::time::Duration = std::time::Duration::from_secs(5);

/// Bounded, in-memory notification store
pub struct NotificationStore {
    records: Vec<Notification>,
    capacity: usize,
    duplicate_window: Duration,
}

impl NotificationStore {
    /// Create a store with default capacity and duplicate window
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, DEFAULT_DUPLICATE_WINDOW)
    }

    /// Create a store with explicit capacity and duplicate-suppression window
    pub fn with_capacity(capacity: usize, duplicate_window: std::time::Duration) -> Self {
        Self {
            records: Vec::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            duplicate_window: Duration::from_std(duplicate_window)
                .unwrap_or_else(|_| Duration::seconds(5)),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a record, evicting one first if the store is at capacity.
    ///
    /// Eviction priority: oldest record that is both read and resolved,
    /// else oldest read record, else oldest record overall. Unread and
    /// unresolved records are the last to go. Returns the evicted record,
    /// if any; eviction is expected behavior, not an error.
    pub fn insert(&mut self, record: Notification) -> Option<Notification> {
        let evicted = if self.records.len() >= self.capacity {
            self.evict_one()
        } else {
            None
        };

        if let Some(ref old) = evicted {
            debug!(
                "store at capacity ({}), evicted {} '{}' (read={}, resolved={})",
                self.capacity, old.kind(), old.title, old.read, old.resolved
            );
        }

        self.records.push(record);
        evicted
    }

    fn evict_one(&mut self) -> Option<Notification> {
        let index = self
            .oldest_index_where(|r| r.read && r.resolved)
            .or_else(|| self.oldest_index_where(|r| r.read))
            .or_else(|| self.oldest_index_where(|_| true))?;
        Some(self.records.remove(index))
    }

    /// Index of the oldest record matching the predicate. Ties resolve to
    /// the earliest-inserted record.
    fn oldest_index_where<F>(&self, predicate: F) -> Option<usize>
    where
        F: Fn(&Notification) -> bool,
    {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| predicate(r))
            .min_by_key(|(_, r)| r.timestamp)
            .map(|(index, _)| index)
    }

    /// The single active record for a subject, if one exists
    pub fn find_active_by_subject(
        &self,
        kind: NotificationKind,
        subject: &SubjectKey,
    ) -> Option<&Notification> {
        self.records
            .iter()
            .find(|r| r.is_active() && r.kind() == kind && &r.subject_key() == subject)
    }

    pub(crate) fn find_active_by_subject_mut(
        &mut self,
        kind: NotificationKind,
        subject: &SubjectKey,
    ) -> Option<&mut Notification> {
        self.records
            .iter_mut()
            .find(|r| r.is_active() && r.kind() == kind && &r.subject_key() == subject)
    }

    /// A record created within the duplicate window with identical kind,
    /// title and message. Absorbs burst duplicates from racing producers;
    /// read/resolved state is deliberately ignored.
    pub fn find_recent_duplicate(
        &self,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> Option<&Notification> {
        let cutoff = Utc::now() - self.duplicate_window;
        self.records
            .iter()
            .rev()
            .find(|r| r.kind() == kind && r.title == title && r.message == message && r.timestamp >= cutoff)
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.records.iter().find(|r| r.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: NotificationId) -> Option<&mut Notification> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    /// Mark a record read. Idempotent; `read` never transitions back to
    /// false. Returns the record and whether this call changed it.
    pub fn mark_read(&mut self, id: NotificationId) -> AlertResult<(Notification, bool)> {
        let record = self.get_mut(id).ok_or_else(|| AlertError::not_found(id))?;
        let changed = !record.read;
        record.read = true;
        Ok((record.clone(), changed))
    }

    /// Set a record's resolved flag. Monotonic: a `false` value never
    /// un-resolves a record, it is an idempotent no-op. Returns the record
    /// and whether this call changed it.
    pub fn mark_resolved(
        &mut self,
        id: NotificationId,
        value: bool,
    ) -> AlertResult<(Notification, bool)> {
        let record = self.get_mut(id).ok_or_else(|| AlertError::not_found(id))?;
        let changed = value && !record.resolved;
        if changed {
            record.resolved = true;
        }
        Ok((record.clone(), changed))
    }

    /// All records, newest first
    pub fn list_all(&self) -> Vec<Notification> {
        self.sorted(|_| true)
    }

    /// Unread records, newest first
    pub fn list_unread(&self) -> Vec<Notification> {
        self.sorted(|r| !r.read)
    }

    /// Unresolved records, newest first
    pub fn list_unresolved(&self) -> Vec<Notification> {
        self.sorted(|r| !r.resolved)
    }

    pub fn unread_count(&self) -> usize {
        self.records.iter().filter(|r| !r.read).count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.records.iter().filter(|r| !r.resolved).count()
    }

    fn sorted<F>(&self, predicate: F) -> Vec<Notification>
    where
        F: Fn(&Notification) -> bool,
    {
        let mut records: Vec<Notification> = self
            .records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }

    /// Backdate a record for window/eviction tests
    #[cfg(test)]
    pub(crate) fn backdate(&mut self, id: NotificationId, by: Duration) {
        if let Some(record) = self.get_mut(id) {
            record.timestamp = record.timestamp - by;
        }
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::record::NotificationData;
    use proptest::prelude::*;

    fn stock_record(product: &str, stock: u32) -> Notification {
        Notification::new(
            "Low Stock Alert",
            format!("{} is running low: {} left in stock", product, stock),
            NotificationData::LowStock {
                product_id: product.to_string(),
                product_name: product.to_string(),
                current_stock: stock,
            },
        )
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut store = NotificationStore::new();
        let record = stock_record("P1", 5);
        let id = record.id;
        assert!(store.insert(record).is_none());

        assert_eq!(store.len(), 1);
        assert!(store.get(id).is_some());
        let active = store
            .find_active_by_subject(
                NotificationKind::LowStock,
                &SubjectKey::Product("P1".to_string()),
            )
            .expect("active record");
        assert_eq!(active.id, id);
    }

    #[test]
    fn test_resolved_records_are_not_active() {
        let mut store = NotificationStore::new();
        let record = stock_record("P1", 5);
        let id = record.id;
        store.insert(record);
        store.mark_resolved(id, true).unwrap();

        assert!(store
            .find_active_by_subject(
                NotificationKind::LowStock,
                &SubjectKey::Product("P1".to_string()),
            )
            .is_none());
    }

    #[test]
    fn test_recent_duplicate_matches_kind_title_message() {
        let mut store = NotificationStore::new();
        store.insert(stock_record("P1", 5));

        assert!(store
            .find_recent_duplicate(
                NotificationKind::LowStock,
                "Low Stock Alert",
                "P1 is running low: 5 left in stock",
            )
            .is_some());
        // Different message is not a duplicate
        assert!(store
            .find_recent_duplicate(
                NotificationKind::LowStock,
                "Low Stock Alert",
                "P1 is running low: 4 left in stock",
            )
            .is_none());
    }

    #[test]
    fn test_duplicate_window_expires() {
        let mut store = NotificationStore::new();
        let record = stock_record("P1", 5);
        let id = record.id;
        store.insert(record);
        store.backdate(id, Duration::seconds(30));

        assert!(store
            .find_recent_duplicate(
                NotificationKind::LowStock,
                "Low Stock Alert",
                "P1 is running low: 5 left in stock",
            )
            .is_none());
    }

    #[test]
    fn test_duplicate_ignores_read_and_resolved() {
        let mut store = NotificationStore::new();
        let record = stock_record("P1", 5);
        let id = record.id;
        store.insert(record);
        store.mark_read(id).unwrap();
        store.mark_resolved(id, true).unwrap();

        assert!(store
            .find_recent_duplicate(
                NotificationKind::LowStock,
                "Low Stock Alert",
                "P1 is running low: 5 left in stock",
            )
            .is_some());
    }

    #[test]
    fn test_mark_read_is_monotonic() {
        let mut store = NotificationStore::new();
        let record = stock_record("P1", 5);
        let id = record.id;
        store.insert(record);

        let (record, changed) = store.mark_read(id).unwrap();
        assert!(record.read);
        assert!(changed);

        let (record, changed) = store.mark_read(id).unwrap();
        assert!(record.read);
        assert!(!changed);
    }

    #[test]
    fn test_mark_resolved_never_unresolves() {
        let mut store = NotificationStore::new();
        let record = stock_record("P1", 5);
        let id = record.id;
        store.insert(record);

        let (_, changed) = store.mark_resolved(id, true).unwrap();
        assert!(changed);

        let (record, changed) = store.mark_resolved(id, false).unwrap();
        assert!(record.resolved, "resolved is one-way");
        assert!(!changed);
    }

    #[test]
    fn test_mark_unknown_id_is_not_found() {
        let mut store = NotificationStore::new();
        let id = NotificationId::generate();
        assert!(matches!(
            store.mark_read(id),
            Err(AlertError::NotFound { .. })
        ));
        assert!(matches!(
            store.mark_resolved(id, true),
            Err(AlertError::NotFound { .. })
        ));
    }

    #[test]
    fn test_eviction_prefers_read_and_resolved() {
        let mut store = NotificationStore::with_capacity(3, DEFAULT_DUPLICATE_WINDOW);

        let untouched = stock_record("P1", 1);
        let read_only = stock_record("P2", 2);
        let handled = stock_record("P3", 3);
        let untouched_id = untouched.id;
        let read_only_id = read_only.id;
        let handled_id = handled.id;

        store.insert(untouched);
        store.insert(read_only);
        store.insert(handled);
        store.mark_read(read_only_id).unwrap();
        store.mark_read(handled_id).unwrap();
        store.mark_resolved(handled_id, true).unwrap();

        let evicted = store.insert(stock_record("P4", 4)).expect("eviction");
        assert_eq!(evicted.id, handled_id, "read+resolved goes first");
        assert_eq!(store.len(), 3);

        // Next tier: the read record, even though it is older than P4
        let evicted = store.insert(stock_record("P5", 5)).expect("eviction");
        assert_eq!(evicted.id, read_only_id);

        // Final tier: pure FIFO on the remaining unread records
        let evicted = store.insert(stock_record("P6", 6)).expect("eviction");
        assert_eq!(evicted.id, untouched_id);
    }

    #[test]
    fn test_eviction_fifo_fallback_at_scale() {
        let mut store = NotificationStore::with_capacity(100, DEFAULT_DUPLICATE_WINDOW);
        let mut first_id = None;
        for i in 0..101 {
            let record = stock_record(&format!("P{}", i), i as u32);
            if i == 0 {
                first_id = Some(record.id);
            }
            // Spread timestamps so "oldest" is well defined
            let id = record.id;
            store.insert(record);
            store.backdate(id, Duration::milliseconds(101 - i as i64));
        }

        assert_eq!(store.len(), 100);
        assert!(store.get(first_id.unwrap()).is_none(), "first in, first out");
    }

    #[test]
    fn test_list_views_are_newest_first() {
        let mut store = NotificationStore::new();
        let first = stock_record("P1", 5);
        let second = stock_record("P2", 3);
        let first_id = first.id;
        let second_id = second.id;
        store.insert(first);
        store.insert(second);
        store.backdate(first_id, Duration::seconds(10));
        store.mark_read(second_id).unwrap();

        let all = store.list_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second_id);
        assert_eq!(all[1].id, first_id);

        let unread = store.list_unread();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, first_id);

        assert_eq!(store.unread_count(), 1);
        assert_eq!(store.unresolved_count(), 2);
    }

    proptest! {
        /// Capacity is never exceeded and every record survives with a
        /// unique id, whatever order insert/mark operations arrive in.
        #[test]
        fn prop_capacity_bound_holds(ops in proptest::collection::vec((0u8..8, 0u32..50), 1..200)) {
            let mut store = NotificationStore::with_capacity(10, DEFAULT_DUPLICATE_WINDOW);
            for (op, value) in ops {
                match op {
                    0..=4 => {
                        store.insert(stock_record(&format!("P{}", value % 20), value));
                    }
                    5 | 6 => {
                        let ids: Vec<NotificationId> = store.list_all().iter().map(|r| r.id).collect();
                        if let Some(id) = ids.get(value as usize % ids.len().max(1)) {
                            let _ = store.mark_read(*id);
                        }
                    }
                    _ => {
                        let ids: Vec<NotificationId> = store.list_all().iter().map(|r| r.id).collect();
                        if let Some(id) = ids.get(value as usize % ids.len().max(1)) {
                            let _ = store.mark_resolved(*id, true);
                        }
                    }
                }
                prop_assert!(store.len() <= store.capacity());
            }

            let all = store.list_all();
            let mut ids: Vec<NotificationId> = all.iter().map(|r| r.id).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), all.len());
        }
    }
}
