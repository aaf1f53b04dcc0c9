//! Email Side-Channel
//!
//! Narrow seam to the outbound email collaborator. The engine only ever
//! fires notifications at it asynchronously and never lets a delivery
//! failure affect a store mutation. Real SMTP/API transports live outside
//! this crate; the implementations here log or discard.

pub mod error;

use async_trait::async_trait;
use log::{debug, info};

pub use error::{EmailError, EmailResult};

/// Outbound email transport
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Deliver a notification email. Called fire-and-forget; the caller
    /// logs failures and moves on.
    async fn send_notification_email(
        &self,
        to: &str,
        name: &str,
        subject: &str,
        message: &str,
    ) -> EmailResult<()>;
}

/// Transport that logs deliveries instead of sending them.
/// Used by the daemon when no real transport is wired in.
pub struct LogMailer;

#[async_trait]
impl EmailTransport for LogMailer {
    async fn send_notification_email(
        &self,
        to: &str,
        name: &str,
        subject: &str,
        message: &str,
    ) -> EmailResult<()> {
        if to.is_empty() || !to.contains('@') {
            return Err(EmailError::invalid_recipient(to));
        }
        info!("email to {} <{}>: {} - {}", name, to, subject, message);
        Ok(())
    }
}

/// Transport that silently discards everything
pub struct NullMailer;

#[async_trait]
impl EmailTransport for NullMailer {
    async fn send_notification_email(
        &self,
        to: &str,
        _name: &str,
        _subject: &str,
        _message: &str,
    ) -> EmailResult<()> {
        debug!("discarding email to {}", to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_rejects_bad_address() {
        let mailer = LogMailer;
        let result = mailer
            .send_notification_email("not-an-address", "Dana", "subject", "body")
            .await;
        assert!(matches!(result, Err(EmailError::InvalidRecipient { .. })));

        let result = mailer
            .send_notification_email("dana@example.com", "Dana", "subject", "body")
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_null_mailer_accepts_everything() {
        let mailer = NullMailer;
        assert!(mailer
            .send_notification_email("anything", "x", "y", "z")
            .await
            .is_ok());
    }
}
