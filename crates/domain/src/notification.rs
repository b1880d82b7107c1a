//! Outbound notification seam and test doubles.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

/// A notification could not be delivered.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Mail API rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Sends e-mail style notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends an HTML message.
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), NotificationError>;

    /// Sends a message rendered by the provider from a stored template.
    async fn send_templated(
        &self,
        to: &str,
        template_id: &str,
        data: serde_json::Value,
    ) -> Result<(), NotificationError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), NotificationError> {
        (**self).send(to, subject, html).await
    }

    async fn send_templated(
        &self,
        to: &str,
        template_id: &str,
        data: serde_json::Value,
    ) -> Result<(), NotificationError> {
        (**self).send_templated(to, template_id, data).await
    }
}

/// Who gets told about new orders, and how.
#[derive(Debug, Clone)]
pub struct NotificationSettings {
    /// Internal address alerted on every new order.
    pub admin_email: Option<String>,
    /// Provider template for the customer confirmation. Plain HTML is sent
    /// when unset.
    pub confirmation_template_id: Option<String>,
    pub store_name: String,
    /// Offset order dates are shown in. UTC unless configured.
    pub display_offset: FixedOffset,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            admin_email: None,
            confirmation_template_id: None,
            store_name: String::new(),
            display_offset: Utc.fix(),
        }
    }
}

impl NotificationSettings {
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            ..Self::default()
        }
    }

    pub fn with_display_offset(mut self, offset: FixedOffset) -> Self {
        self.display_offset = offset;
        self
    }

    pub fn with_admin_email(mut self, email: impl Into<String>) -> Self {
        self.admin_email = Some(email.into());
        self
    }

    pub fn with_confirmation_template(mut self, template_id: impl Into<String>) -> Self {
        self.confirmation_template_id = Some(template_id.into());
        self
    }
}

/// A message captured by [`InMemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SentMessage {
    Html {
        to: String,
        subject: String,
        body: String,
    },
    Templated {
        to: String,
        template_id: String,
        data: serde_json::Value,
    },
}

impl SentMessage {
    pub fn to(&self) -> &str {
        match self {
            SentMessage::Html { to, .. } | SentMessage::Templated { to, .. } => to,
        }
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<SentMessage>,
    fail: bool,
}

/// Records messages instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail.
    pub async fn set_fail(&self, fail: bool) {
        self.state.write().await.fail = fail;
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.state.read().await.sent.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.state.read().await.sent.len()
    }

    async fn record(&self, message: SentMessage) -> Result<(), NotificationError> {
        let mut state = self.state.write().await;
        if state.fail {
            return Err(NotificationError::Transport(format!(
                "delivery to {} failed",
                message.to()
            )));
        }
        state.sent.push(message);
        Ok(())
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), NotificationError> {
        self.record(SentMessage::Html {
            to: to.to_string(),
            subject: subject.to_string(),
            body: html.to_string(),
        })
        .await
    }

    async fn send_templated(
        &self,
        to: &str,
        template_id: &str,
        data: serde_json::Value,
    ) -> Result<(), NotificationError> {
        self.record(SentMessage::Templated {
            to: to.to_string(),
            template_id: template_id.to_string(),
            data,
        })
        .await
    }
}

/// Writes notifications to the log. Used when no mail API is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), NotificationError> {
        tracing::info!(to, subject, bytes = html.len(), "notification (not sent)");
        Ok(())
    }

    async fn send_templated(
        &self,
        to: &str,
        template_id: &str,
        data: serde_json::Value,
    ) -> Result<(), NotificationError> {
        tracing::info!(to, template_id, %data, "templated notification (not sent)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_messages() {
        let notifier = InMemoryNotifier::new();

        notifier
            .send("a@example.com", "Hola", "<p>hi</p>")
            .await
            .unwrap();
        notifier
            .send_templated("b@example.com", "d-123", serde_json::json!({"order_id": 1}))
            .await
            .unwrap();

        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to(), "a@example.com");
        assert!(matches!(&sent[1], SentMessage::Templated { template_id, .. } if template_id == "d-123"));
    }

    #[tokio::test]
    async fn fail_switch_rejects_and_records_nothing() {
        let notifier = InMemoryNotifier::new();
        notifier.set_fail(true).await;

        let result = notifier.send("a@example.com", "Hola", "x").await;

        assert!(matches!(result, Err(NotificationError::Transport(_))));
        assert_eq!(notifier.sent_count().await, 0);
    }

    #[tokio::test]
    async fn shared_notifier_forwards_through_arc() {
        let inner = Arc::new(InMemoryNotifier::new());
        let shared: Arc<dyn Notifier> = inner.clone();

        shared.send("a@example.com", "s", "b").await.unwrap();

        assert_eq!(inner.sent_count().await, 1);
    }

    #[tokio::test]
    async fn log_notifier_never_fails() {
        assert!(LogNotifier.send("a@example.com", "s", "b").await.is_ok());
    }
}
