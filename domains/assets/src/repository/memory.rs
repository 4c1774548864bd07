//! In-process asset store
//!
//! Backs local development without `DATABASE_URL` and every service-level
//! test. Transactions are fully serialized: `begin` takes the store mutex and
//! works on a copy of the state, which replaces the shared state on `commit`.
//! A dropped transaction releases the mutex and discards its copy.
//!
//! Because the mutex is held for the life of a transaction, callers must not
//! use the non-transactional `AssetStore` reads while holding an `AssetTx`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use shutterdesk_common::{Error, Result};

use super::{AssetStore, AssetTx};
use crate::domain::entities::{
    AssetsStatus, BatchSummary, BookingAssets, DeliveryStatus, DeliveryToken, PaymentSummary,
    Photo, PhotoStats, ProcessingStatus, UploadBatch,
};

#[derive(Debug, Clone)]
struct LineItem {
    booking_id: Uuid,
    unit_price: Decimal,
    quantity: i32,
}

#[derive(Debug, Clone)]
struct Payment {
    booking_id: Uuid,
    amount: Decimal,
    completed: bool,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    bookings: Vec<BookingAssets>,
    line_items: Vec<LineItem>,
    payments: Vec<Payment>,
    batches: Vec<UploadBatch>,
    photos: Vec<Photo>,
    tokens: Vec<DeliveryToken>,
}

impl MemoryState {
    fn booking(&self, id: Uuid) -> Option<&BookingAssets> {
        self.bookings.iter().find(|b| b.id == id)
    }

    fn batch(&self, id: Uuid) -> Option<&UploadBatch> {
        self.batches.iter().find(|b| b.id == id)
    }

    fn photo(&self, id: Uuid) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == id)
    }

    fn photo_mut(&mut self, id: Uuid) -> Option<&mut Photo> {
        self.photos.iter_mut().find(|p| p.id == id)
    }

    fn summary(&self, batch: &UploadBatch) -> BatchSummary {
        let photo_count = self
            .photos
            .iter()
            .filter(|p| p.batch_id == Some(batch.id))
            .count() as i64;
        BatchSummary {
            batch: batch.clone(),
            photo_count,
        }
    }

    /// Batches for a booking, newest first (ties broken by insertion order)
    fn batches_for(&self, booking_id: Uuid) -> Vec<UploadBatch> {
        let mut batches: Vec<UploadBatch> = self
            .batches
            .iter()
            .rev()
            .filter(|b| b.booking_id == booking_id)
            .cloned()
            .collect();
        batches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        batches
    }

    fn photos_for(&self, booking_id: Uuid) -> Vec<Photo> {
        self.photos
            .iter()
            .filter(|p| p.booking_id == booking_id)
            .cloned()
            .collect()
    }
}

/// Serializable in-memory store
#[derive(Clone, Default)]
pub struct MemoryAssetStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a booking read model
    pub async fn insert_booking(&self, booking: BookingAssets) {
        let mut state = self.state.lock().await;
        state.bookings.retain(|b| b.id != booking.id);
        state.bookings.push(booking);
    }

    /// Seed a billable line item
    pub async fn add_line_item(&self, booking_id: Uuid, unit_price: Decimal, quantity: i32) {
        self.state.lock().await.line_items.push(LineItem {
            booking_id,
            unit_price,
            quantity,
        });
    }

    /// Seed a payment; only completed payments count toward paid-in-full
    pub async fn add_payment(&self, booking_id: Uuid, amount: Decimal, completed: bool) {
        self.state.lock().await.payments.push(Payment {
            booking_id,
            amount,
            completed,
        });
    }

    /// Overwrite a photo's expiry
    pub async fn set_photo_expiry(&self, photo_id: Uuid, expires_at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.lock().await;
        let photo = state
            .photo_mut(photo_id)
            .ok_or_else(|| Error::NotFound("Photo not found".to_string()))?;
        photo.expires_at = expires_at;
        Ok(())
    }

    /// Mark a booking delivered, as the external booking workflow would
    pub async fn set_delivery_status(&self, booking_id: Uuid, status: DeliveryStatus) -> Result<()> {
        let mut state = self.state.lock().await;
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| Error::NotFound("Booking not found".to_string()))?;
        booking.delivery_status = status;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AssetStore for MemoryAssetStore {
    async fn begin(&self) -> Result<Box<dyn AssetTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryAssetTx { guard, working }))
    }

    async fn find_booking(&self, id: Uuid) -> Result<Option<BookingAssets>> {
        Ok(self.state.lock().await.booking(id).cloned())
    }

    async fn find_batch(&self, id: Uuid) -> Result<Option<UploadBatch>> {
        Ok(self.state.lock().await.batch(id).cloned())
    }

    async fn find_batch_summary(&self, id: Uuid) -> Result<Option<BatchSummary>> {
        let state = self.state.lock().await;
        Ok(state.batch(id).map(|b| state.summary(b)))
    }

    async fn list_batches(&self, booking_id: Uuid) -> Result<Vec<BatchSummary>> {
        let state = self.state.lock().await;
        Ok(state
            .batches_for(booking_id)
            .iter()
            .map(|b| state.summary(b))
            .collect())
    }

    async fn find_photo(&self, id: Uuid) -> Result<Option<Photo>> {
        Ok(self.state.lock().await.photo(id).cloned())
    }

    async fn list_photos(
        &self,
        booking_id: Uuid,
        processing_status: Option<ProcessingStatus>,
    ) -> Result<Vec<Photo>> {
        let state = self.state.lock().await;
        Ok(state
            .photos_for(booking_id)
            .into_iter()
            .filter(|p| processing_status.is_none_or(|s| p.processing_status == s))
            .collect())
    }

    async fn photo_stats(&self, booking_id: Uuid) -> Result<PhotoStats> {
        let state = self.state.lock().await;
        Ok(PhotoStats::from_photos(&state.photos_for(booking_id)))
    }

    async fn find_delivery_token(&self, token_hash: &str) -> Result<Option<DeliveryToken>> {
        let state = self.state.lock().await;
        Ok(state
            .tokens
            .iter()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn payment_summary(&self, booking_id: Uuid) -> Result<PaymentSummary> {
        let state = self.state.lock().await;
        let total_due = state
            .line_items
            .iter()
            .filter(|i| i.booking_id == booking_id)
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum();
        let total_paid = state
            .payments
            .iter()
            .filter(|p| p.booking_id == booking_id && p.completed)
            .map(|p| p.amount)
            .sum();
        Ok(PaymentSummary {
            total_due,
            total_paid,
        })
    }

    async fn find_expiring_photos(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Photo>> {
        let state = self.state.lock().await;
        let mut photos: Vec<Photo> = state
            .photos
            .iter()
            .filter(|p| p.expires_at > now && p.expires_at <= until && !p.expiration_warning_sent)
            .cloned()
            .collect();
        photos.sort_by_key(|p| p.expires_at);
        Ok(photos)
    }

    async fn claim_expiration_warning(&self, photo_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state.photo_mut(photo_id) {
            Some(photo) if !photo.expiration_warning_sent => {
                photo.expiration_warning_sent = true;
                photo.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub struct MemoryAssetTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait::async_trait]
impl AssetTx for MemoryAssetTx {
    async fn lock_booking(&mut self, booking_id: Uuid) -> Result<Option<BookingAssets>> {
        Ok(self.working.booking(booking_id).cloned())
    }

    async fn find_batch(&mut self, id: Uuid) -> Result<Option<UploadBatch>> {
        Ok(self.working.batch(id).cloned())
    }

    async fn find_photo(&mut self, id: Uuid) -> Result<Option<Photo>> {
        Ok(self.working.photo(id).cloned())
    }

    async fn photos_for_booking(&mut self, booking_id: Uuid) -> Result<Vec<Photo>> {
        Ok(self.working.photos_for(booking_id))
    }

    async fn batches_for_booking(&mut self, booking_id: Uuid) -> Result<Vec<UploadBatch>> {
        Ok(self.working.batches_for(booking_id))
    }

    async fn insert_batch(&mut self, batch: &UploadBatch) -> Result<()> {
        if self.working.batch(batch.id).is_some() {
            return Err(Error::InvalidState(format!("Batch {} already exists", batch.id)));
        }
        self.working.batches.push(batch.clone());
        Ok(())
    }

    async fn update_batch(&mut self, batch: &UploadBatch) -> Result<()> {
        let stored = self
            .working
            .batches
            .iter_mut()
            .find(|b| b.id == batch.id)
            .ok_or_else(|| Error::NotFound("Batch not found".to_string()))?;
        *stored = batch.clone();
        Ok(())
    }

    async fn insert_photo(&mut self, photo: &Photo) -> Result<()> {
        if self.working.photo(photo.id).is_some() {
            return Err(Error::InvalidState(format!("Photo {} already exists", photo.id)));
        }
        self.working.photos.push(photo.clone());
        Ok(())
    }

    async fn update_photo(&mut self, photo: &Photo) -> Result<()> {
        let stored = self
            .working
            .photo_mut(photo.id)
            .ok_or_else(|| Error::NotFound("Photo not found".to_string()))?;
        let warning_sent = stored.expiration_warning_sent;
        *stored = photo.clone();
        stored.expiration_warning_sent = warning_sent;
        Ok(())
    }

    async fn update_booking_status(
        &mut self,
        booking_id: Uuid,
        assets_status: AssetsStatus,
        delivery_status: DeliveryStatus,
    ) -> Result<()> {
        let booking = self
            .working
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| Error::NotFound("Booking not found".to_string()))?;
        booking.assets_status = assets_status;
        booking.delivery_status = delivery_status;
        Ok(())
    }

    async fn insert_delivery_token(&mut self, token: &DeliveryToken) -> Result<()> {
        self.working.tokens.push(token.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryAssetTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
