use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::domain::loyalty::{CustomerId, Notification};
use crate::metrics::Metrics;
use crate::utils::{retry_with_backoff, RetryConfig, RetryResult};

// ============================================================================
// Notification Activity
// ============================================================================
//
// Side-effecting, at-least-once delivery of customer notifications. The
// actor never waits on a reply and never fails a signal because a
// notification could not be delivered.
//
// ============================================================================

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_notification(&self, recipient: &CustomerId, text: &str) -> anyhow::Result<()>;
}

/// Writes notifications to the log, standing in for an email gateway
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_notification(&self, recipient: &CustomerId, text: &str) -> anyhow::Result<()> {
        tracing::info!(customer_id = %recipient, contents = text, "📧 Sending email");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub recipient: CustomerId,
    pub text: String,
}

/// Keeps every delivered notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
    failures_remaining: Mutex<u32>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `failures` deliveries before accepting any
    pub fn failing(failures: u32) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures_remaining: Mutex::new(failures),
        }
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn texts_for(&self, recipient: &CustomerId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|n| &n.recipient == recipient)
            .map(|n| n.text)
            .collect()
    }

    /// How many times `text` was delivered to anyone
    pub fn count(&self, text: &str) -> usize {
        self.sent().iter().filter(|n| n.text == text).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_notification(&self, recipient: &CustomerId, text: &str) -> anyhow::Result<()> {
        {
            let mut remaining = self
                .failures_remaining
                .lock()
                .map_err(|_| anyhow::anyhow!("notifier state poisoned"))?;
            if *remaining > 0 {
                *remaining -= 1;
                anyhow::bail!("mail gateway unavailable");
            }
        }

        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("notifier state poisoned"))?
            .push(SentNotification {
                recipient: recipient.clone(),
                text: text.to_string(),
            });
        Ok(())
    }
}

// ============================================================================
// Dispatcher - retrying, best-effort front of a Notifier
// ============================================================================

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    retry: RetryConfig,
    metrics: Arc<Metrics>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, retry: RetryConfig, metrics: Arc<Metrics>) -> Self {
        Self { notifier, retry, metrics }
    }

    /// Deliver a notification, retrying with backoff
    /// Returns whether it was delivered; failures are logged, never raised
    pub async fn dispatch(&self, recipient: &CustomerId, notification: Notification) -> bool {
        let text = notification.to_string();

        let result = retry_with_backoff("send_notification", &self.retry, |_attempt| {
            let notifier = self.notifier.clone();
            let text = text.as_str();
            async move { notifier.send_notification(recipient, text).await }
        })
        .await;

        let delivered = result.is_success();
        self.metrics.record_notification(notification.kind(), delivered);

        if let RetryResult::Failed { error, attempts } = result {
            tracing::error!(
                customer_id = %recipient,
                kind = notification.kind(),
                attempts = attempts,
                error = %error,
                "Giving up on notification"
            );
        }

        delivered
    }
}
