//! Asset Record Store
//!
//! Pure persistence: keyed reads, booking-scoped queries and transactional
//! writes. No business rules live here.
//!
//! Every mutating unit of work opens an `AssetTx` and locks the booking row
//! first (`lock_booking`); the booking lock linearizes all mutations of that
//! booking's photos, batches and status fields. Dropping a transaction
//! without `commit` rolls it back.

pub mod memory;
pub mod postgres;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use shutterdesk_common::Result;

use crate::domain::entities::{
    AssetsStatus, BatchSummary, BookingAssets, DeliveryStatus, DeliveryToken, PaymentSummary,
    Photo, PhotoStats, ProcessingStatus, UploadBatch,
};

/// Store handle shared by the service layer
#[async_trait::async_trait]
pub trait AssetStore: Send + Sync {
    /// Begin a transaction
    async fn begin(&self) -> Result<Box<dyn AssetTx>>;

    async fn find_booking(&self, id: Uuid) -> Result<Option<BookingAssets>>;

    async fn find_batch(&self, id: Uuid) -> Result<Option<UploadBatch>>;

    /// Batch with its photo count
    async fn find_batch_summary(&self, id: Uuid) -> Result<Option<BatchSummary>>;

    /// Batches for a booking, newest first, each with its photo count
    async fn list_batches(&self, booking_id: Uuid) -> Result<Vec<BatchSummary>>;

    async fn find_photo(&self, id: Uuid) -> Result<Option<Photo>>;

    /// Photos for a booking, oldest first, optionally filtered by editorial state
    async fn list_photos(
        &self,
        booking_id: Uuid,
        processing_status: Option<ProcessingStatus>,
    ) -> Result<Vec<Photo>>;

    async fn photo_stats(&self, booking_id: Uuid) -> Result<PhotoStats>;

    async fn find_delivery_token(&self, token_hash: &str) -> Result<Option<DeliveryToken>>;

    /// Line-item total and completed-payment total for a booking
    async fn payment_summary(&self, booking_id: Uuid) -> Result<PaymentSummary>;

    /// Photos with `now < expires_at <= until` whose warning has not been sent
    async fn find_expiring_photos(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Photo>>;

    /// Compare-and-set the expiry warning flag, committed immediately.
    ///
    /// Returns `false` when another sweep already claimed the photo.
    async fn claim_expiration_warning(&self, photo_id: Uuid) -> Result<bool>;
}

/// One unit of work against the store
#[async_trait::async_trait]
pub trait AssetTx: Send {
    /// Lock the booking row for the rest of the transaction
    async fn lock_booking(&mut self, booking_id: Uuid) -> Result<Option<BookingAssets>>;

    async fn find_batch(&mut self, id: Uuid) -> Result<Option<UploadBatch>>;

    async fn find_photo(&mut self, id: Uuid) -> Result<Option<Photo>>;

    async fn photos_for_booking(&mut self, booking_id: Uuid) -> Result<Vec<Photo>>;

    async fn batches_for_booking(&mut self, booking_id: Uuid) -> Result<Vec<UploadBatch>>;

    async fn insert_batch(&mut self, batch: &UploadBatch) -> Result<()>;

    async fn update_batch(&mut self, batch: &UploadBatch) -> Result<()>;

    async fn insert_photo(&mut self, photo: &Photo) -> Result<()>;

    async fn update_photo(&mut self, photo: &Photo) -> Result<()>;

    async fn update_booking_status(
        &mut self,
        booking_id: Uuid,
        assets_status: AssetsStatus,
        delivery_status: DeliveryStatus,
    ) -> Result<()>;

    async fn insert_delivery_token(&mut self, token: &DeliveryToken) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
