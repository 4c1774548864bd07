//! AWS SES Notification Sink
//!
//! Email goes out through AWS Simple Email Service (LocalStack-compatible).
//! SES has no SMS transport; SMS requests are reported as failed channels.

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_ses::config::SharedCredentialsProvider;
use aws_sdk_ses::types::{Body, Content, Destination, Message};
use aws_sdk_ses::Client as SesClient;
use chrono::Utc;

use crate::{
    Channel, ChannelReport, DispatchReport, Notification, NotificationSink, NotifyConfig,
    NotifyError,
};

/// AWS SES notification sink
pub struct SesNotificationSink {
    client: SesClient,
    config: NotifyConfig,
}

impl SesNotificationSink {
    /// Create a new SES notification sink
    pub async fn new(config: NotifyConfig) -> Result<Self, NotifyError> {
        if !config.default_from.contains('@') {
            return Err(NotifyError::Configuration(format!(
                "NOTIFY_FROM '{}' is not an email address",
                config.default_from
            )));
        }

        let region = config
            .aws_region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let aws_config = match config.aws_endpoint_url.as_ref() {
            Some(endpoint_url) => {
                tracing::info!("Using custom AWS endpoint: {}", endpoint_url);

                let credentials = Credentials::new(
                    "test-access-key",
                    "test-secret-key",
                    None,
                    None,
                    "localstack-notify-provider",
                );

                aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region))
                    .endpoint_url(endpoint_url)
                    .credentials_provider(SharedCredentialsProvider::new(credentials))
                    .load()
                    .await
            }
            None => {
                aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region))
                    .load()
                    .await
            }
        };

        let client = SesClient::new(&aws_config);

        Ok(Self { client, config })
    }

    fn build_ses_message(&self, notification: &Notification) -> Result<Message, NotifyError> {
        let subject = Content::builder()
            .data(&notification.subject)
            .charset("UTF-8")
            .build()
            .map_err(|e| NotifyError::AwsSes(format!("Failed to build subject: {}", e)))?;

        let text_content = Content::builder()
            .data(&notification.body_text)
            .charset("UTF-8")
            .build()
            .map_err(|e| NotifyError::AwsSes(format!("Failed to build text content: {}", e)))?;

        let mut body_builder = Body::builder().text(text_content);

        if let Some(html_body) = &notification.body_html {
            let html_content = Content::builder()
                .data(html_body)
                .charset("UTF-8")
                .build()
                .map_err(|e| {
                    NotifyError::AwsSes(format!("Failed to build HTML content: {}", e))
                })?;

            body_builder = body_builder.html(html_content);
        }

        Ok(Message::builder()
            .subject(subject)
            .body(body_builder.build())
            .build())
    }

    async fn send_email(&self, notification: &Notification) -> Result<String, NotifyError> {
        let to = notification
            .recipient
            .email
            .as_deref()
            .filter(|e| e.contains('@'))
            .ok_or_else(|| {
                NotifyError::Validation("Recipient has no valid email address".to_string())
            })?;

        let result = self
            .client
            .send_email()
            .source(&self.config.default_from)
            .destination(Destination::builder().to_addresses(to).build())
            .message(self.build_ses_message(notification)?)
            .send()
            .await
            .map_err(|e| NotifyError::AwsSes(format!("Failed to send email: {}", e)))?;

        Ok(result.message_id().to_string())
    }
}

#[async_trait::async_trait]
impl NotificationSink for SesNotificationSink {
    async fn dispatch(&self, notification: Notification) -> Result<DispatchReport, NotifyError> {
        let mut channels = Vec::with_capacity(notification.channels.len());

        for channel in &notification.channels {
            let report = match channel {
                Channel::Email => match self.send_email(&notification).await {
                    Ok(message_id) => {
                        tracing::info!(message_id = %message_id, "Email sent via SES");
                        ChannelReport::delivered(Channel::Email, message_id)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "SES email delivery failed");
                        ChannelReport::failed(Channel::Email, e.to_string())
                    }
                },
                Channel::Sms => ChannelReport::failed(
                    Channel::Sms,
                    "SMS is not supported by the SES provider",
                ),
            };
            channels.push(report);
        }

        Ok(DispatchReport {
            channels,
            dispatched_at: Utc::now(),
            provider: "aws-ses".to_string(),
        })
    }

    fn provider(&self) -> &'static str {
        "aws-ses"
    }

    fn app_base_url(&self) -> &str {
        &self.config.app_base_url
    }
}
