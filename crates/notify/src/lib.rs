//! Shutterdesk Notification Sink
//!
//! Outbound client notifications, treated by the asset pipeline as a black box
//! that reports per-channel success or failure:
//! - AWS SES for email delivery (LocalStack-compatible)
//! - Mock sink that captures notifications and can be told to fail
//! - Expiry-warning content shared by every sink

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod aws_ses;
pub mod content;
pub mod mock;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification configuration error: {0}")]
    Configuration(String),

    #[error("Notification validation error: {0}")]
    Validation(String),

    #[error("AWS SES error: {0}")]
    AwsSes(String),

    #[error("Notification dispatch failed: {0}")]
    Dispatch(String),
}

impl From<NotifyError> for shutterdesk_common::Error {
    fn from(err: NotifyError) -> Self {
        match err {
            NotifyError::Configuration(msg) => shutterdesk_common::Error::Configuration(msg),
            NotifyError::Validation(msg) => shutterdesk_common::Error::Validation(msg),
            NotifyError::AwsSes(msg) | NotifyError::Dispatch(msg) => {
                shutterdesk_common::Error::Transient(msg)
            }
        }
    }
}

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Email => write!(f, "email"),
            Channel::Sms => write!(f, "sms"),
        }
    }
}

/// Contact details for the person being notified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Recipient {
    /// Channels this recipient can be reached on
    pub fn reachable_channels(&self) -> Vec<Channel> {
        let mut channels = Vec::new();
        if self.email.as_deref().is_some_and(|e| !e.trim().is_empty()) {
            channels.push(Channel::Email);
        }
        if self.phone.as_deref().is_some_and(|p| !p.trim().is_empty()) {
            channels.push(Channel::Sms);
        }
        channels
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("there")
    }
}

/// Notification to be dispatched over one or more channels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: Recipient,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
    pub channels: Vec<Channel>,
    pub metadata: HashMap<String, String>,
}

impl Notification {
    pub fn new(recipient: Recipient, subject: String, body_text: String) -> Self {
        let channels = recipient.reachable_channels();
        Self {
            recipient,
            subject,
            body_text,
            body_html: None,
            channels,
            metadata: HashMap::new(),
        }
    }

    /// Add HTML body content (email only)
    pub fn with_html(mut self, body_html: String) -> Self {
        self.body_html = Some(body_html);
        self
    }

    /// Add metadata for tracking
    pub fn with_metadata(mut self, key: String, value: String) -> Self {
        self.metadata.insert(key, value);
        self
    }
}

/// Outcome of one channel attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelReport {
    pub channel: Channel,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChannelReport {
    pub fn delivered(channel: Channel, message_id: String) -> Self {
        Self {
            channel,
            delivered: true,
            message_id: Some(message_id),
            error: None,
        }
    }

    pub fn failed(channel: Channel, error: impl Into<String>) -> Self {
        Self {
            channel,
            delivered: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Per-channel results of a dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    pub channels: Vec<ChannelReport>,
    pub dispatched_at: DateTime<Utc>,
    pub provider: String,
}

impl DispatchReport {
    pub fn any_delivered(&self) -> bool {
        self.channels.iter().any(|c| c.delivered)
    }
}

/// Notification sink configuration
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Sink provider (ses, mock)
    pub provider: String,
    /// AWS region for SES
    pub aws_region: Option<String>,
    /// AWS endpoint URL (for LocalStack)
    pub aws_endpoint_url: Option<String>,
    /// Default from address
    pub default_from: String,
    /// Enable dispatch (can disable for testing)
    pub enabled: bool,
    /// Base URL for the client gallery (used in notification links)
    pub app_base_url: String,
}

impl NotifyConfig {
    /// Create notify config from environment variables
    pub fn from_env() -> Result<Self, NotifyError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("NOTIFY_PROVIDER").unwrap_or_else(|_| "mock".to_string());

        let aws_region = std::env::var("AWS_REGION").ok();
        let aws_endpoint_url = std::env::var("AWS_ENDPOINT_URL").ok();

        let default_from =
            std::env::var("NOTIFY_FROM").unwrap_or_else(|_| "studio@shutterdesk.app".to_string());

        let enabled = std::env::var("NOTIFY_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let app_base_url = std::env::var("APP_BASE_URL")
            .unwrap_or_else(|_| "https://shutterdesk.app".to_string());

        Ok(Self {
            provider,
            aws_region,
            aws_endpoint_url,
            default_from,
            enabled,
            app_base_url,
        })
    }
}

/// Notification sink trait for different implementations
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Attempt delivery on every requested channel.
    ///
    /// A channel failure is reported in the returned `DispatchReport`; `Err` is
    /// reserved for failures that prevent any attempt at all.
    async fn dispatch(&self, notification: Notification) -> Result<DispatchReport, NotifyError>;

    /// Short provider name for logs
    fn provider(&self) -> &'static str;

    /// Return the client gallery base URL for building links
    fn app_base_url(&self) -> &str;

    /// Warn a client that one of their booking's photos is about to expire
    async fn send_expiry_warning(
        &self,
        recipient: Recipient,
        booking_id: Uuid,
        photo_id: Uuid,
        file_name: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<DispatchReport, NotifyError> {
        let gallery_url = format!("{}/bookings/{}/gallery", self.app_base_url(), booking_id);

        let subject = "Your photos will expire soon".to_string();
        let body_text = content::expiry_warning_text(
            recipient.display_name(),
            file_name,
            expires_at,
            &gallery_url,
        );
        let body_html = content::expiry_warning_html(
            recipient.display_name(),
            file_name,
            expires_at,
            &gallery_url,
        );

        let notification = Notification::new(recipient, subject, body_text)
            .with_html(body_html)
            .with_metadata("notification_type".to_string(), "photo_expiry".to_string())
            .with_metadata("booking_id".to_string(), booking_id.to_string())
            .with_metadata("photo_id".to_string(), photo_id.to_string());

        self.dispatch(notification).await
    }
}

/// Notification sink factory
pub struct NotificationSinkFactory;

impl NotificationSinkFactory {
    /// Create a notification sink based on configuration
    pub async fn create(config: NotifyConfig) -> Result<Box<dyn NotificationSink>, NotifyError> {
        if !config.enabled {
            tracing::info!("Notifications disabled, using mock sink");
            return Ok(Box::new(mock::MockNotificationSink::new()));
        }

        match config.provider.as_str() {
            "ses" | "aws-ses" => {
                tracing::info!("Creating AWS SES notification sink");
                let sink = aws_ses::SesNotificationSink::new(config).await?;
                Ok(Box::new(sink))
            }
            "mock" => {
                tracing::info!("Creating mock notification sink");
                Ok(Box::new(mock::MockNotificationSink::new()))
            }
            provider => Err(NotifyError::Configuration(format!(
                "Unknown notification provider: {}. Supported providers: ses, mock",
                provider
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(email: Option<&str>, phone: Option<&str>) -> Recipient {
        Recipient {
            name: Some("Ada".to_string()),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        }
    }

    #[test]
    fn test_reachable_channels() {
        assert_eq!(
            recipient(Some("ada@example.com"), Some("+2348000000000")).reachable_channels(),
            vec![Channel::Email, Channel::Sms]
        );
        assert_eq!(
            recipient(None, Some("+2348000000000")).reachable_channels(),
            vec![Channel::Sms]
        );
        assert!(recipient(Some("  "), None).reachable_channels().is_empty());
    }

    #[test]
    fn test_notification_creation() {
        let notification = Notification::new(
            recipient(Some("ada@example.com"), None),
            "Subject".to_string(),
            "Body".to_string(),
        )
        .with_html("<p>Body</p>".to_string())
        .with_metadata("photo_id".to_string(), "123".to_string());

        assert_eq!(notification.channels, vec![Channel::Email]);
        assert_eq!(notification.body_html, Some("<p>Body</p>".to_string()));
        assert_eq!(
            notification.metadata.get("photo_id"),
            Some(&"123".to_string())
        );
    }

    #[test]
    fn test_dispatch_report_any_delivered() {
        let report = DispatchReport {
            channels: vec![
                ChannelReport::failed(Channel::Sms, "no gateway"),
                ChannelReport::delivered(Channel::Email, "m-1".to_string()),
            ],
            dispatched_at: Utc::now(),
            provider: "test".to_string(),
        };
        assert!(report.any_delivered());

        let report = DispatchReport {
            channels: vec![ChannelReport::failed(Channel::Sms, "no gateway")],
            dispatched_at: Utc::now(),
            provider: "test".to_string(),
        };
        assert!(!report.any_delivered());
    }

    #[test]
    fn test_channel_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Channel::Sms).unwrap(), "\"sms\"");
    }

    #[test]
    fn test_notify_errors_map_to_taxonomy() {
        use shutterdesk_common::Error;

        let err: Error = NotifyError::Configuration("no sender".to_string()).into();
        assert!(matches!(err, Error::Configuration(_)));

        let err: Error = NotifyError::AwsSes("throttled".to_string()).into();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_factory_unknown_provider() {
        let config = NotifyConfig {
            provider: "pigeon".to_string(),
            aws_region: None,
            aws_endpoint_url: None,
            default_from: "studio@shutterdesk.app".to_string(),
            enabled: true,
            app_base_url: "https://shutterdesk.app".to_string(),
        };
        assert!(matches!(
            NotificationSinkFactory::create(config).await,
            Err(NotifyError::Configuration(_))
        ));
    }
}
