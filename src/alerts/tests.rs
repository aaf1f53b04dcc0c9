//! Tests for the Notification Alert Engine
//!
//! Exercises the client API end to end: emit/coalesce/suppress behavior,
//! the clear lifecycle, mark operations, feed subscriptions and the email
//! side-channel.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_stream::StreamExt;

use crate::alerts::{
    EmailRecipient, EmitRequest, FeedEvent, FeedFilter, NotificationData, NotificationKind,
    NotificationService, NotificationStore, SubjectKey,
};
use crate::email::{EmailError, EmailResult, EmailTransport};

/// Mailer that records every send
struct RecordingMailer {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    should_fail: bool,
}

impl RecordingMailer {
    fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            should_fail: false,
        }
    }

    fn new_failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            should_fail: true,
        }
    }

    async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl EmailTransport for RecordingMailer {
    async fn send_notification_email(
        &self,
        to: &str,
        _name: &str,
        subject: &str,
        _message: &str,
    ) -> EmailResult<()> {
        if self.should_fail {
            return Err(EmailError::delivery_failed(to, "mock failure"));
        }
        self.sent
            .lock()
            .await
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

fn service_with(mailer: Arc<RecordingMailer>) -> NotificationService {
    NotificationService::new(mailer)
}

fn low_stock(product: &str, stock: u32) -> EmitRequest {
    EmitRequest::new(
        "Low Stock Alert",
        format!("{} is running low: {} left in stock", product, stock),
        NotificationData::LowStock {
            product_id: product.to_string(),
            product_name: product.to_string(),
            current_stock: stock,
        },
    )
}

#[tokio::test]
async fn test_emit_broadcasts_create_once_for_duplicates() {
    let service = service_with(Arc::new(RecordingMailer::new()));
    let (_id, mut stream) = service.subscribe().await;
    assert!(stream.next().await.unwrap().is_snapshot());

    let first = service.emit(low_stock("P1", 5), None).await;
    let second = service.emit(low_stock("P1", 5), None).await;
    assert_eq!(first.id, second.id);

    assert!(matches!(
        stream.next().await,
        Some(FeedEvent::Created { .. })
    ));

    // The duplicate produced no second event; the next thing the stream
    // sees is a later, different emission
    service.emit(low_stock("P2", 3), None).await;
    match stream.next().await {
        Some(FeedEvent::Created { notification }) => {
            assert_eq!(
                notification.subject_key(),
                SubjectKey::Product("P2".to_string())
            );
        }
        other => panic!("expected create for P2, got {:?}", other),
    }

    assert_eq!(service.list(FeedFilter::All).await.len(), 2);
}

#[tokio::test]
async fn test_coalescing_emits_create_then_update() {
    let service = service_with(Arc::new(RecordingMailer::new()));
    let (_id, mut stream) = service.subscribe().await;
    assert!(stream.next().await.unwrap().is_snapshot());

    service.emit(low_stock("P1", 5), None).await;
    // Different stock level -> different message -> not a window duplicate
    service.emit(low_stock("P1", 3), None).await;

    assert!(matches!(
        stream.next().await,
        Some(FeedEvent::Created { .. })
    ));
    match stream.next().await {
        Some(FeedEvent::Updated { notification }) => match notification.data {
            NotificationData::LowStock { current_stock, .. } => assert_eq!(current_stock, 3),
            _ => panic!("wrong payload"),
        },
        other => panic!("expected update, got {:?}", other),
    }

    assert_eq!(service.list(FeedFilter::All).await.len(), 1);
}

#[tokio::test]
async fn test_clear_lifecycle_scenario() {
    // Emit low stock for P1, then the scan reports it replenished
    let service = service_with(Arc::new(RecordingMailer::new()));

    service.emit(low_stock("P1", 5), None).await;
    assert_eq!(service.counts().await.unresolved, 1);

    let terminal = service
        .clear(
            NotificationKind::LowStock,
            &SubjectKey::Product("P1".to_string()),
            "Stock Replenished",
            "P1 is back above the low-stock threshold: 20 in stock",
            Some(NotificationData::LowStock {
                product_id: "P1".to_string(),
                product_name: "P1".to_string(),
                current_stock: 20,
            }),
        )
        .await
        .expect("active record cleared");
    assert!(terminal.resolved);

    let all = service.list(FeedFilter::All).await;
    assert_eq!(all.len(), 2, "frozen alert plus terminal record");
    assert!(all.iter().all(|r| r.resolved));
    assert_eq!(service.counts().await.unresolved, 0);

    // Second clear is a no-op
    assert!(service
        .clear(
            NotificationKind::LowStock,
            &SubjectKey::Product("P1".to_string()),
            "Stock Replenished",
            "again",
            None,
        )
        .await
        .is_none());
}

#[tokio::test]
async fn test_mark_read_confirms_to_all_observers_once() {
    let service = service_with(Arc::new(RecordingMailer::new()));
    let record = service.emit(low_stock("P1", 5), None).await;

    let (_a, mut stream_a) = service.subscribe().await;
    let (_b, mut stream_b) = service.subscribe().await;
    assert!(stream_a.next().await.unwrap().is_snapshot());
    assert!(stream_b.next().await.unwrap().is_snapshot());

    assert!(service.mark_read(record.id).await);
    for stream in [&mut stream_a, &mut stream_b] {
        match stream.next().await {
            Some(FeedEvent::Updated { notification }) => {
                assert_eq!(notification.id, record.id);
                assert!(notification.read);
            }
            other => panic!("expected update, got {:?}", other),
        }
    }

    // Already read: success, but no second broadcast
    assert!(service.mark_read(record.id).await);
    service.emit(low_stock("P2", 1), None).await;
    assert!(matches!(
        stream_a.next().await,
        Some(FeedEvent::Created { .. })
    ));
}

#[tokio::test]
async fn test_mark_operations_on_unknown_id() {
    let service = service_with(Arc::new(RecordingMailer::new()));
    let id = crate::alerts::NotificationId::generate();
    assert!(!service.mark_read(id).await);
    assert!(!service.mark_resolved(id, true).await);
}

#[tokio::test]
async fn test_mark_resolved_is_one_way() {
    let service = service_with(Arc::new(RecordingMailer::new()));
    let record = service.emit(low_stock("P1", 5), None).await;

    assert!(service.mark_resolved(record.id, true).await);
    assert!(service.mark_resolved(record.id, false).await);
    let record = service.get(record.id).await.unwrap();
    assert!(record.resolved, "resolved never flips back");
}

#[tokio::test]
async fn test_snapshot_reflects_store_at_subscribe_time() {
    let service = service_with(Arc::new(RecordingMailer::new()));
    service.emit(low_stock("P1", 5), None).await;
    service.emit(low_stock("P2", 2), None).await;

    let (_id, mut stream) = service.subscribe().await;
    match stream.next().await {
        Some(FeedEvent::Snapshot { notifications }) => {
            assert_eq!(notifications.len(), 2);
        }
        other => panic!("expected snapshot, got {:?}", other),
    }
}

#[tokio::test]
async fn test_email_sent_on_creation() {
    let mailer = Arc::new(RecordingMailer::new());
    let service = service_with(Arc::clone(&mailer));

    service
        .emit(
            EmitRequest::new(
                "Purchase Complete",
                "Dana spent 42.00",
                NotificationData::Purchase {
                    member_id: "M7".to_string(),
                    member_name: "Dana".to_string(),
                    amount_cents: 4200,
                },
            ),
            Some(EmailRecipient::new("dana@example.com", "Dana")),
        )
        .await;

    // Dispatch is fire-and-forget; give the spawned task a moment
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let sent = mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "dana@example.com");
    assert_eq!(sent[0].1, "Purchase Complete");
}

#[tokio::test]
async fn test_email_failure_never_fails_the_emit() {
    let mailer = Arc::new(RecordingMailer::new_failing());
    let service = service_with(Arc::clone(&mailer));

    let record = service
        .emit(
            low_stock("P1", 5),
            Some(EmailRecipient::new("dana@example.com", "Dana")),
        )
        .await;

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    // The mutation stands even though delivery failed
    assert!(service.get(record.id).await.is_some());
    assert_eq!(service.counts().await.unresolved, 1);
}

#[tokio::test]
async fn test_no_email_for_suppressed_duplicates() {
    let mailer = Arc::new(RecordingMailer::new());
    let service = service_with(Arc::clone(&mailer));
    let recipient = Some(EmailRecipient::new("dana@example.com", "Dana"));

    service.emit(low_stock("P1", 5), recipient.clone()).await;
    service.emit(low_stock("P1", 5), recipient).await;

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(mailer.sent().await.len(), 1);
}

#[tokio::test]
async fn test_capacity_bound_through_the_service() {
    let mailer: Arc<RecordingMailer> = Arc::new(RecordingMailer::new());
    let store = NotificationStore::with_capacity(100, std::time::Duration::from_secs(5));
    let service = NotificationService::with_store(store, mailer);

    for i in 0..101 {
        service.emit(low_stock(&format!("P{}", i), i as u32), None).await;
    }

    let all = service.list(FeedFilter::All).await;
    assert_eq!(all.len(), 100);
    assert!(
        !all.iter()
            .any(|r| r.subject_key() == SubjectKey::Product("P0".to_string())),
        "the very first record was evicted (FIFO fallback)"
    );
}
