//! Application configuration loaded from environment variables.

use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use mailer::{DEFAULT_API_URL, MailerConfig};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `"json"` for structured logs, anything else for text
/// - `DATABASE_URL`: PostgreSQL URL; unset runs on a seeded in-memory store
/// - `SESSION_IDLE_MINUTES`: cart session idle timeout (default: `30`)
/// - `ADMIN_NOTIFICATION_EMAIL`: alerted on every new order
/// - `MAIL_API_URL`, `MAIL_API_KEY`, `MAIL_FROM_EMAIL`, `MAIL_FROM_NAME`:
///   transactional mail API; mail is only logged without a key
/// - `ORDER_CONFIRMATION_TEMPLATE_ID`: provider template for confirmations
/// - `DISPLAY_UTC_OFFSET_HOURS`: store-local offset order dates are shown in
///   (default: `0`, range `-23..=23`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub json_logs: bool,
    pub database_url: Option<String>,
    pub session_idle_minutes: u64,
    pub admin_notification_email: Option<String>,
    pub mail_api_url: String,
    pub mail_api_key: Option<String>,
    pub mail_from_email: String,
    pub mail_from_name: String,
    pub confirmation_template_id: Option<String>,
    pub display_utc_offset_hours: i32,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            json_logs: non_empty("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            database_url: non_empty("DATABASE_URL"),
            session_idle_minutes: non_empty("SESSION_IDLE_MINUTES")
                .and_then(|m| m.parse().ok())
                .filter(|m| *m > 0)
                .unwrap_or(defaults.session_idle_minutes),
            admin_notification_email: non_empty("ADMIN_NOTIFICATION_EMAIL"),
            mail_api_url: non_empty("MAIL_API_URL").unwrap_or(defaults.mail_api_url),
            mail_api_key: non_empty("MAIL_API_KEY"),
            mail_from_email: non_empty("MAIL_FROM_EMAIL").unwrap_or(defaults.mail_from_email),
            mail_from_name: non_empty("MAIL_FROM_NAME").unwrap_or(defaults.mail_from_name),
            confirmation_template_id: non_empty("ORDER_CONFIRMATION_TEMPLATE_ID"),
            display_utc_offset_hours: non_empty("DISPLAY_UTC_OFFSET_HOURS")
                .and_then(|h| h.trim().parse().ok())
                .filter(|h: &i32| (-23..=23).contains(h))
                .unwrap_or(defaults.display_utc_offset_hours),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes * 60)
    }

    /// Offset used when showing order dates.
    pub fn display_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.display_utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }

    /// Mail API settings, present only when an API key is configured.
    pub fn mailer(&self) -> Option<MailerConfig> {
        self.mail_api_key.as_ref().map(|key| MailerConfig {
            api_url: self.mail_api_url.clone(),
            api_key: key.clone(),
            from_email: self.mail_from_email.clone(),
            from_name: self.mail_from_name.clone(),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            json_logs: false,
            database_url: None,
            session_idle_minutes: 30,
            admin_notification_email: None,
            mail_api_url: DEFAULT_API_URL.to_string(),
            mail_api_key: None,
            mail_from_email: "orders@example.com".to_string(),
            mail_from_name: "Storefront".to_string(),
            confirmation_template_id: None,
            display_utc_offset_hours: 0,
        }
    }
}
