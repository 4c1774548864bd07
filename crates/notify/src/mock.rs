//! Mock Notification Sink
//!
//! Captures notifications in memory for tests and local development. Channels
//! can be told to fail, the whole dispatch can be told to error, and a delay can
//! be injected to exercise caller timeouts.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Channel, ChannelReport, DispatchReport, Notification, NotificationSink, NotifyError};

/// Notification captured by the mock sink
#[derive(Debug, Clone)]
pub struct CapturedNotification {
    pub notification: Notification,
    pub report: DispatchReport,
    pub captured_at: DateTime<Utc>,
}

impl CapturedNotification {
    /// Photo this notification was about, from metadata
    pub fn photo_id(&self) -> Option<Uuid> {
        self.notification
            .metadata
            .get("photo_id")
            .and_then(|id| Uuid::parse_str(id).ok())
    }
}

#[derive(Debug, Default)]
struct MockBehaviour {
    failing_channels: HashSet<Channel>,
    dispatch_error: Option<String>,
    delay: Option<Duration>,
}

/// Mock notification sink for testing
#[derive(Debug, Clone)]
pub struct MockNotificationSink {
    captured: Arc<Mutex<Vec<CapturedNotification>>>,
    behaviour: Arc<Mutex<MockBehaviour>>,
    app_base_url: String,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockNotificationSink {
    pub fn new() -> Self {
        Self {
            captured: Arc::new(Mutex::new(Vec::new())),
            behaviour: Arc::new(Mutex::new(MockBehaviour::default())),
            app_base_url: "https://shutterdesk.app".to_string(),
        }
    }

    /// Report every attempt on `channel` as failed
    pub fn fail_channel(&self, channel: Channel) {
        lock(&self.behaviour).failing_channels.insert(channel);
    }

    /// Make `dispatch` itself return an error
    pub fn fail_dispatch(&self, reason: &str) {
        lock(&self.behaviour).dispatch_error = Some(reason.to_string());
    }

    /// Sleep before every dispatch
    pub fn set_delay(&self, delay: Duration) {
        lock(&self.behaviour).delay = Some(delay);
    }

    /// Restore default behaviour (every channel succeeds)
    pub fn reset(&self) {
        *lock(&self.behaviour) = MockBehaviour::default();
    }

    pub fn captured(&self) -> Vec<CapturedNotification> {
        lock(&self.captured).clone()
    }

    /// Notifications captured about one photo
    pub fn captured_for_photo(&self, photo_id: Uuid) -> Vec<CapturedNotification> {
        self.captured()
            .into_iter()
            .filter(|c| c.photo_id() == Some(photo_id))
            .collect()
    }

    pub fn count(&self) -> usize {
        lock(&self.captured).len()
    }

    pub fn clear(&self) {
        lock(&self.captured).clear();
    }
}

impl Default for MockNotificationSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NotificationSink for MockNotificationSink {
    async fn dispatch(&self, notification: Notification) -> Result<DispatchReport, NotifyError> {
        let (failing, dispatch_error, delay) = {
            let behaviour = lock(&self.behaviour);
            (
                behaviour.failing_channels.clone(),
                behaviour.dispatch_error.clone(),
                behaviour.delay,
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(reason) = dispatch_error {
            tracing::warn!(reason = %reason, "Mock sink failing dispatch");
            return Err(NotifyError::Dispatch(reason));
        }

        let channels = notification
            .channels
            .iter()
            .map(|channel| {
                if failing.contains(channel) {
                    ChannelReport::failed(*channel, "mock channel failure")
                } else {
                    ChannelReport::delivered(*channel, format!("mock-{}", Uuid::new_v4()))
                }
            })
            .collect();

        let report = DispatchReport {
            channels,
            dispatched_at: Utc::now(),
            provider: "mock".to_string(),
        };

        tracing::info!(
            subject = %notification.subject,
            channels = notification.channels.len(),
            "Mock sink captured notification"
        );

        lock(&self.captured).push(CapturedNotification {
            notification,
            report: report.clone(),
            captured_at: Utc::now(),
        });

        Ok(report)
    }

    fn provider(&self) -> &'static str {
        "mock"
    }

    fn app_base_url(&self) -> &str {
        &self.app_base_url
    }
}
