//! Delivery gating and staff retrieval
//!
//! A client reaches a booking's approved photos only through a delivery
//! token. The gate checks, in order: token known, token not expired, booking
//! paid in full. Staff retrieval skips the gate but stays inside studio scope.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use shutterdesk_auth::AuthContext;
use shutterdesk_common::{generate_token, hash_token, Error, Result};
use shutterdesk_storage::UrlAudience;

use super::{
    ensure_reviewer, lock_scoped_booking, AssetService, DEFAULT_DELIVERY_TOKEN_DAYS,
    MAX_DELIVERY_TOKEN_DAYS,
};
use crate::domain::entities::{DeliveryToken, Photo, PhotoStatus};

/// Raw delivery token, returned exactly once
#[derive(Debug, Clone, Serialize)]
pub struct IssuedDeliveryToken {
    pub token: String,
    pub booking_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Client-facing view of a deliverable photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliverablePhoto {
    pub id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub status: PhotoStatus,
    pub download_count: i32,
}

impl From<&Photo> for DeliverablePhoto {
    fn from(photo: &Photo) -> Self {
        Self {
            id: photo.id,
            file_name: photo.file_name.clone(),
            file_size: photo.file_size,
            mime_type: photo.mime_type.clone(),
            status: photo.status,
            download_count: photo.download_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadGrant {
    pub photo_id: Uuid,
    pub url: String,
    pub expires_at: DateTime<Utc>,
    pub download_count: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffPhotoUrl {
    pub photo_id: Uuid,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

fn photo_not_found() -> Error {
    Error::NotFound("Photo not found".to_string())
}

impl AssetService {
    /// Mint a delivery token for a booking
    pub async fn issue_delivery_token(
        &self,
        ctx: &AuthContext,
        booking_id: Uuid,
        valid_for_days: Option<i64>,
    ) -> Result<IssuedDeliveryToken> {
        ensure_reviewer(ctx)?;
        let days = valid_for_days.unwrap_or(DEFAULT_DELIVERY_TOKEN_DAYS);
        if !(1..=MAX_DELIVERY_TOKEN_DAYS).contains(&days) {
            return Err(Error::Validation(format!(
                "valid_for_days must be between 1 and {}",
                MAX_DELIVERY_TOKEN_DAYS
            )));
        }

        let token = generate_token()?;
        let now = Utc::now();
        let record = DeliveryToken {
            id: Uuid::new_v4(),
            booking_id,
            token_hash: hash_token(&token),
            expires_at: now + Duration::days(days),
            created_by: ctx.user_id,
            created_at: now,
        };

        let mut tx = self.store.begin().await?;
        lock_scoped_booking(tx.as_mut(), ctx, booking_id).await?;
        tx.insert_delivery_token(&record).await?;
        tx.commit().await?;

        tracing::info!(
            token_id = %record.id,
            booking_id = %booking_id,
            expires_at = %record.expires_at,
            "Delivery token issued"
        );
        Ok(IssuedDeliveryToken {
            token,
            booking_id,
            expires_at: record.expires_at,
        })
    }

    /// Resolve a raw token and enforce expiry and payment
    async fn open_delivery(&self, token: &str) -> Result<DeliveryToken> {
        let record = self
            .store
            .find_delivery_token(&hash_token(token))
            .await?
            .ok_or_else(|| Error::NotFound("Delivery token not found".to_string()))?;

        if record.is_expired_at(Utc::now()) {
            return Err(Error::Gone("Delivery token has expired".to_string()));
        }

        let payments = self.store.payment_summary(record.booking_id).await?;
        if !payments.is_paid_in_full() {
            tracing::info!(
                booking_id = %record.booking_id,
                balance = %payments.balance(),
                "Delivery blocked by outstanding balance"
            );
            return Err(Error::PaymentRequired {
                balance: payments.balance(),
            });
        }

        Ok(record)
    }

    /// Photos a token holder may download
    pub async fn list_deliverable(&self, token: &str) -> Result<Vec<DeliverablePhoto>> {
        let record = self.open_delivery(token).await?;
        let photos = self.store.list_photos(record.booking_id, None).await?;
        Ok(photos
            .iter()
            .filter(|photo| photo.status.is_deliverable())
            .map(DeliverablePhoto::from)
            .collect())
    }

    /// Hand a token holder a URL for one photo and record the download.
    ///
    /// The URL is signed first so a signing failure leaves the counters alone.
    pub async fn resolve_download(&self, token: &str, photo_id: Uuid) -> Result<DownloadGrant> {
        let record = self.open_delivery(token).await?;

        let photo = self
            .store
            .find_photo(photo_id)
            .await?
            .filter(|photo| photo.booking_id == record.booking_id && photo.status.is_deliverable())
            .ok_or_else(photo_not_found)?;

        let signed = self
            .gateway
            .resolve(
                photo.retrieval_key(),
                UrlAudience::PublicPaid {
                    token_expires_at: record.expires_at,
                },
            )
            .await?;

        let mut tx = self.store.begin().await?;
        tx.lock_booking(record.booking_id)
            .await?
            .ok_or_else(|| Error::NotFound("Booking not found".to_string()))?;
        let mut photo = tx
            .find_photo(photo_id)
            .await?
            .filter(|photo| photo.status.is_deliverable())
            .ok_or_else(photo_not_found)?;
        photo.record_download(Utc::now());
        tx.update_photo(&photo).await?;
        tx.commit().await?;

        tracing::info!(
            photo_id = %photo_id,
            booking_id = %record.booking_id,
            download_count = photo.download_count,
            "Client download resolved"
        );
        Ok(DownloadGrant {
            photo_id,
            url: signed.url,
            expires_at: signed.expires_at,
            download_count: photo.download_count,
        })
    }

    /// Short-lived signed URL for authenticated staff
    pub async fn staff_photo_url(&self, ctx: &AuthContext, photo_id: Uuid) -> Result<StaffPhotoUrl> {
        let photo = self
            .store
            .find_photo(photo_id)
            .await?
            .ok_or_else(photo_not_found)?;
        self.scoped_booking(ctx, photo.booking_id)
            .await
            .map_err(|_| photo_not_found())?;

        let signed = self
            .gateway
            .resolve(photo.retrieval_key(), UrlAudience::Internal)
            .await?;
        Ok(StaffPhotoUrl {
            photo_id,
            url: signed.url,
            expires_at: signed.expires_at,
        })
    }
}
