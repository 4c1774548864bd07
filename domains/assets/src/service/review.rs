//! Photo Review/Approval Engine
//!
//! Every operation runs under the booking lock and finishes with
//! [`settle_review`], which promotes batches when the whole booking is
//! approved and reprojects the booking in the same transaction.

use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use shutterdesk_auth::AuthContext;
use shutterdesk_common::{Error, Result};
use shutterdesk_storage::keys;

use super::{
    ensure_reviewer, lock_scoped_booking, reproject, AssetService, ReviewAction, ReviewOutcome,
};
use crate::domain::entities::{BookingAssets, DeliveryStatus, PhotoStats, ProcessingStatus};
use crate::domain::projection::BookingProjector;
use crate::domain::state::ReviewEvent;
use crate::repository::AssetTx;

impl From<ReviewAction> for ReviewEvent {
    fn from(action: ReviewAction) -> Self {
        match action {
            ReviewAction::Approve => ReviewEvent::Approve,
            ReviewAction::Reject => ReviewEvent::Reject,
        }
    }
}

fn photo_not_found() -> Error {
    Error::NotFound("Photo not found".to_string())
}

/// All-approved recheck plus projection, inside the caller's transaction
async fn settle_review(
    tx: &mut dyn AssetTx,
    booking: &BookingAssets,
    affected: usize,
) -> Result<ReviewOutcome> {
    let photos = tx.photos_for_booking(booking.id).await?;

    if BookingProjector::all_approved(&photos) {
        for mut batch in tx.batches_for_booking(booking.id).await? {
            if batch.promote_on_all_approved() {
                tx.update_batch(&batch).await?;
                tracing::info!(
                    batch_id = %batch.id,
                    booking_id = %booking.id,
                    "Batch completed after full approval"
                );
            }
        }
    }

    let projection = reproject(tx, booking, None).await?;
    Ok(ReviewOutcome {
        affected,
        stats: PhotoStats::from_photos(&photos),
        delivery_status: projection.delivery_status,
        booking_ready: projection.delivery_status == DeliveryStatus::Ready,
    })
}

impl AssetService {
    /// Approve or reject the listed photos of a booking.
    ///
    /// Ids that do not belong to the booking are ignored; `affected` counts
    /// the ones that do, including photos already in the target state.
    pub async fn review(
        &self,
        ctx: &AuthContext,
        booking_id: Uuid,
        action: ReviewAction,
        photo_ids: &[Uuid],
    ) -> Result<ReviewOutcome> {
        ensure_reviewer(ctx)?;
        if photo_ids.is_empty() {
            return Err(Error::Validation(
                "At least one photo id is required".to_string(),
            ));
        }
        let wanted: HashSet<Uuid> = photo_ids.iter().copied().collect();
        let event = ReviewEvent::from(action);

        let mut tx = self.store.begin().await?;
        let booking = lock_scoped_booking(tx.as_mut(), ctx, booking_id).await?;

        let mut affected = 0;
        let mut changed = 0;
        for mut photo in tx.photos_for_booking(booking_id).await? {
            if !wanted.contains(&photo.id) {
                continue;
            }
            affected += 1;
            if photo.apply(event)? {
                tx.update_photo(&photo).await?;
                changed += 1;
            }
        }

        let outcome = settle_review(tx.as_mut(), &booking, affected).await?;
        tx.commit().await?;

        tracing::info!(
            booking_id = %booking_id,
            action = %event,
            requested = photo_ids.len(),
            affected,
            changed,
            reviewer_id = %ctx.user_id,
            "Photos reviewed"
        );
        Ok(outcome)
    }

    /// Approve every photo still in review, optionally within one batch
    pub async fn approve_all(
        &self,
        ctx: &AuthContext,
        booking_id: Uuid,
        batch_id: Option<Uuid>,
    ) -> Result<ReviewOutcome> {
        ensure_reviewer(ctx)?;

        let mut tx = self.store.begin().await?;
        let booking = lock_scoped_booking(tx.as_mut(), ctx, booking_id).await?;

        if let Some(batch_id) = batch_id {
            match tx.find_batch(batch_id).await? {
                Some(batch) if batch.booking_id == booking_id => {}
                _ => return Err(Error::NotFound("Batch not found".to_string())),
            }
        }

        let mut affected = 0;
        for mut photo in tx.photos_for_booking(booking_id).await? {
            if batch_id.is_some() && photo.batch_id != batch_id {
                continue;
            }
            if !matches!(
                photo.processing_status,
                ProcessingStatus::Editing | ProcessingStatus::Edited
            ) {
                continue;
            }
            photo.apply(ReviewEvent::Approve)?;
            tx.update_photo(&photo).await?;
            affected += 1;
        }

        let outcome = settle_review(tx.as_mut(), &booking, affected).await?;
        tx.commit().await?;

        tracing::info!(
            booking_id = %booking_id,
            batch_id = ?batch_id,
            affected,
            booking_ready = outcome.booking_ready,
            "Approved all photos"
        );
        Ok(outcome)
    }

    /// Record the edited rendition of a photo
    pub async fn mark_edited(
        &self,
        ctx: &AuthContext,
        photo_id: Uuid,
        edited_key: &str,
        thumbnail_key: Option<&str>,
    ) -> Result<ReviewOutcome> {
        ensure_reviewer(ctx)?;

        let booking_id = self
            .store
            .find_photo(photo_id)
            .await?
            .ok_or_else(photo_not_found)?
            .booking_id;
        for key in std::iter::once(edited_key).chain(thumbnail_key) {
            keys::validate_key(key)?;
            if !keys::belongs_to_booking(key, booking_id) {
                return Err(Error::Validation(format!(
                    "Key '{}' is outside the booking's storage prefix",
                    key
                )));
            }
        }

        let mut tx = self.store.begin().await?;
        let booking = lock_scoped_booking(tx.as_mut(), ctx, booking_id)
            .await
            .map_err(|_| photo_not_found())?;
        let mut photo = tx.find_photo(photo_id).await?.ok_or_else(photo_not_found)?;

        photo.apply(ReviewEvent::MarkEdited)?;
        photo.edited_key = Some(edited_key.to_string());
        if let Some(thumbnail_key) = thumbnail_key {
            photo.thumbnail_key = Some(thumbnail_key.to_string());
        }
        photo.updated_at = Utc::now();
        tx.update_photo(&photo).await?;

        let outcome = settle_review(tx.as_mut(), &booking, 1).await?;
        tx.commit().await?;

        tracing::info!(
            photo_id = %photo_id,
            booking_id = %booking_id,
            "Edited rendition recorded"
        );
        Ok(outcome)
    }
}
