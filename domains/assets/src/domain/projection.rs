//! Booking aggregate projection
//!
//! Derives the booking's `assets_status` from the upload event being applied
//! and its `delivery_status` from the photos. Pure: callers run it inside the same transaction as the
//! mutation that triggered it and persist the result.

use serde::Serialize;

use crate::domain::entities::{AssetsStatus, BatchStatus, BookingAssets, DeliveryStatus, Photo};

/// Batch lifecycle moves that drive `assets_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadEvent {
    BatchOpened,
    /// A batch was completed with the given resulting status
    BatchClosed(BatchStatus),
}

/// Derived booking status fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub assets_status: AssetsStatus,
    pub delivery_status: DeliveryStatus,
}

pub struct BookingProjector;

impl BookingProjector {
    /// Every photo approved, and there is at least one photo
    pub fn all_approved(photos: &[Photo]) -> bool {
        !photos.is_empty() && photos.iter().all(Photo::is_approved)
    }

    /// Upload progress after an upload event.
    ///
    /// Each transition is driven by the batch that just moved: opening one
    /// means uploading; closing one applies that batch's outcome alone. A
    /// batch left in review, or no event at all, keeps the status as found.
    pub fn project_assets(current: AssetsStatus, event: Option<UploadEvent>) -> AssetsStatus {
        match event {
            Some(UploadEvent::BatchOpened) => AssetsStatus::Uploading,
            Some(UploadEvent::BatchClosed(BatchStatus::Completed)) => AssetsStatus::Uploaded,
            Some(UploadEvent::BatchClosed(BatchStatus::Failed)) => AssetsStatus::NotUploaded,
            Some(UploadEvent::BatchClosed(_)) | None => current,
        }
    }

    /// Delivery readiness.
    ///
    /// READY is owned here: entered exactly when every photo is approved, left
    /// (back to EDITING) as soon as one is not. DELIVERED is never demoted.
    pub fn project_delivery(current: DeliveryStatus, photos: &[Photo]) -> DeliveryStatus {
        let ready = Self::all_approved(photos);
        match current {
            DeliveryStatus::Delivered => DeliveryStatus::Delivered,
            _ if ready => DeliveryStatus::Ready,
            DeliveryStatus::Ready => DeliveryStatus::Editing,
            other => other,
        }
    }

    pub fn project(
        booking: &BookingAssets,
        event: Option<UploadEvent>,
        photos: &[Photo],
    ) -> Projection {
        Projection {
            assets_status: Self::project_assets(booking.assets_status, event),
            delivery_status: Self::project_delivery(booking.delivery_status, photos),
        }
    }
}
