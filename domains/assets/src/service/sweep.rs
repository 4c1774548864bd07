//! Expiry-warning sweep
//!
//! Invoked by an external scheduler. Each photo's warning flag is claimed
//! and committed before the notification goes out, so a photo is warned at
//! most once even when sweeps overlap or a dispatch fails.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use shutterdesk_common::{Error, Result};
use shutterdesk_notify::{ChannelReport, Recipient};

use super::{AssetService, MAX_SWEEP_HORIZON_DAYS};
use crate::domain::entities::{BookingAssets, Photo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SweepOutcome {
    /// At least one channel accepted the warning
    Notified,
    Failed,
    /// Another sweep claimed the photo first
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub photo_id: Uuid,
    pub booking_id: Uuid,
    pub outcome: SweepOutcome,
    pub channels: Vec<ChannelReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SweepResult {
    fn new(photo: &Photo, outcome: SweepOutcome) -> Self {
        Self {
            photo_id: photo.id,
            booking_id: photo.booking_id,
            outcome,
            channels: Vec::new(),
            error: None,
        }
    }

    fn failed(photo: &Photo, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(photo, SweepOutcome::Failed)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub horizon_days: i64,
    pub scanned: usize,
    pub results: Vec<SweepResult>,
}

impl SweepReport {
    pub fn count(&self, outcome: SweepOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }
}

fn recipient_for(booking: &BookingAssets) -> Recipient {
    Recipient {
        name: booking.client_name.clone(),
        email: booking.client_email.clone(),
        phone: booking.client_phone.clone(),
    }
}

impl AssetService {
    /// Warn clients about photos expiring within `horizon_days`
    pub async fn sweep_expiring_photos(&self, horizon_days: Option<i64>) -> Result<SweepReport> {
        let horizon_days = horizon_days.unwrap_or(self.config.expiry_warning_horizon_days);
        if !(1..=MAX_SWEEP_HORIZON_DAYS).contains(&horizon_days) {
            return Err(Error::Validation(format!(
                "horizon_days must be between 1 and {}",
                MAX_SWEEP_HORIZON_DAYS
            )));
        }

        let now = Utc::now();
        let photos = self
            .store
            .find_expiring_photos(now, now + Duration::days(horizon_days))
            .await?;
        tracing::info!(
            horizon_days,
            candidates = photos.len(),
            "Starting expiry-warning sweep"
        );

        let mut bookings: HashMap<Uuid, Option<BookingAssets>> = HashMap::new();
        let mut results = Vec::with_capacity(photos.len());
        for photo in &photos {
            let result = self.warn_photo(photo, &mut bookings).await;
            match result.outcome {
                SweepOutcome::Notified => {
                    tracing::info!(photo_id = %photo.id, "Expiry warning sent")
                }
                SweepOutcome::Failed => tracing::warn!(
                    photo_id = %photo.id,
                    booking_id = %photo.booking_id,
                    error = result.error.as_deref().unwrap_or("all channels failed"),
                    "Expiry warning not delivered"
                ),
                SweepOutcome::Skipped => {
                    tracing::debug!(photo_id = %photo.id, "Expiry warning already claimed")
                }
            }
            results.push(result);
        }

        let report = SweepReport {
            horizon_days,
            scanned: photos.len(),
            results,
        };
        tracing::info!(
            scanned = report.scanned,
            notified = report.count(SweepOutcome::Notified),
            failed = report.count(SweepOutcome::Failed),
            skipped = report.count(SweepOutcome::Skipped),
            "Expiry-warning sweep finished"
        );
        Ok(report)
    }

    async fn warn_photo(
        &self,
        photo: &Photo,
        bookings: &mut HashMap<Uuid, Option<BookingAssets>>,
    ) -> SweepResult {
        match self.store.claim_expiration_warning(photo.id).await {
            Ok(true) => {}
            Ok(false) => return SweepResult::new(photo, SweepOutcome::Skipped),
            Err(e) => return SweepResult::failed(photo, e.to_string()),
        }

        let booking = match bookings.get(&photo.booking_id) {
            Some(cached) => cached.clone(),
            None => match self.store.find_booking(photo.booking_id).await {
                Ok(found) => {
                    bookings.insert(photo.booking_id, found.clone());
                    found
                }
                Err(e) => return SweepResult::failed(photo, e.to_string()),
            },
        };
        let Some(booking) = booking else {
            return SweepResult::failed(photo, "Booking not found");
        };

        let recipient = recipient_for(&booking);
        if recipient.reachable_channels().is_empty() {
            return SweepResult::failed(photo, "Booking has no client contact details");
        }

        let timeout = self.config.outbound_timeout;
        let dispatch = self.sink.send_expiry_warning(
            recipient,
            booking.id,
            photo.id,
            &photo.file_name,
            photo.expires_at,
        );
        match tokio::time::timeout(timeout, dispatch).await {
            Err(_) => SweepResult::failed(
                photo,
                Error::Transient(format!("Notification dispatch timed out after {:?}", timeout))
                    .to_string(),
            ),
            Ok(Err(e)) => SweepResult::failed(photo, Error::from(e).to_string()),
            Ok(Ok(report)) => {
                let outcome = if report.any_delivered() {
                    SweepOutcome::Notified
                } else {
                    SweepOutcome::Failed
                };
                SweepResult {
                    channels: report.channels,
                    ..SweepResult::new(photo, outcome)
                }
            }
        }
    }
}
