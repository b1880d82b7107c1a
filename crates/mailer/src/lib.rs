//! HTTP client for a transactional mail API.
//!
//! Messages are posted as JSON in the `personalizations` / `from` / `content`
//! shape used by SendGrid-compatible providers, authenticated with a bearer
//! API key.

use async_trait::async_trait;
use domain::{NotificationError, Notifier};
use reqwest::Client;
use serde::Serialize;

/// Default endpoint for sending mail.
pub const DEFAULT_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Configuration for the mail API.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Full URL of the send endpoint.
    pub api_url: String,

    /// API key sent as a bearer token.
    pub api_key: String,

    pub from_email: String,
    pub from_name: String,
}

/// Sends notifications through the mail API.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    config: MailerConfig,
    http: Client,
}

impl HttpMailer {
    #[must_use]
    pub fn new(config: MailerConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn sender(&self) -> Address<'_> {
        Address {
            email: &self.config.from_email,
            name: Some(&self.config.from_name),
        }
    }

    async fn post(&self, message: &MailMessage<'_>) -> Result<(), NotificationError> {
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(message)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(%status, "mail accepted");
        Ok(())
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    #[tracing::instrument(skip(self, html))]
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), NotificationError> {
        let message = MailMessage {
            personalizations: vec![Personalization {
                to: vec![Address { email: to, name: None }],
                dynamic_template_data: None,
            }],
            from: self.sender(),
            subject: Some(subject),
            content: Some(vec![Content {
                kind: "text/html",
                value: html,
            }]),
            template_id: None,
        };
        self.post(&message).await
    }

    #[tracing::instrument(skip(self, data))]
    async fn send_templated(
        &self,
        to: &str,
        template_id: &str,
        data: serde_json::Value,
    ) -> Result<(), NotificationError> {
        let message = MailMessage {
            personalizations: vec![Personalization {
                to: vec![Address { email: to, name: None }],
                dynamic_template_data: Some(data),
            }],
            from: self.sender(),
            subject: None,
            content: None,
            template_id: Some(template_id),
        };
        self.post(&message).await
    }
}

#[derive(Debug, Serialize)]
struct MailMessage<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<Vec<Content<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dynamic_template_data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}
