//! Asset pipeline operations
//!
//! `AssetService` owns the store, the URL gateway and the notification sink,
//! all injected at construction. Each submodule implements one component:
//! - `batches`: Upload Batch Tracker
//! - `review`: Photo Review/Approval Engine
//! - `delivery`: client delivery gating and staff retrieval
//! - `sweep`: expiry-warning sweep

mod batches;
mod delivery;
mod review;
mod sweep;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shutterdesk_auth::AuthContext;
use shutterdesk_common::{Config, Error, Result};
use shutterdesk_notify::NotificationSink;
use shutterdesk_storage::UrlGateway;

use crate::domain::entities::{BookingAssets, DeliveryStatus, PhotoStats};
use crate::domain::projection::{BookingProjector, Projection, UploadEvent};
use crate::repository::{AssetStore, AssetTx};

pub use batches::{PhotoListing, RegisteredUpload};
pub use delivery::{DeliverablePhoto, DownloadGrant, IssuedDeliveryToken, StaffPhotoUrl};
pub use sweep::{SweepOutcome, SweepReport, SweepResult};

/// Default delivery token lifetime
pub const DEFAULT_DELIVERY_TOKEN_DAYS: i64 = 14;

/// Longest delivery token lifetime
pub const MAX_DELIVERY_TOKEN_DAYS: i64 = 90;

/// Widest expiry-warning horizon a sweep accepts
pub const MAX_SWEEP_HORIZON_DAYS: i64 = 30;

/// Runtime settings for the asset pipeline
#[derive(Debug, Clone)]
pub struct AssetsConfig {
    pub photo_retention_days: i64,
    pub expiry_warning_horizon_days: i64,
    pub outbound_timeout: Duration,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            photo_retention_days: shutterdesk_common::config::DEFAULT_PHOTO_RETENTION_DAYS,
            expiry_warning_horizon_days:
                shutterdesk_common::config::DEFAULT_EXPIRY_WARNING_HORIZON_DAYS,
            outbound_timeout: Duration::from_secs(
                shutterdesk_common::config::DEFAULT_OUTBOUND_TIMEOUT_SECS,
            ),
        }
    }
}

impl From<&Config> for AssetsConfig {
    fn from(config: &Config) -> Self {
        Self {
            photo_retention_days: config.photo_retention_days,
            expiry_warning_horizon_days: config.expiry_warning_horizon_days,
            outbound_timeout: Duration::from_secs(config.outbound_timeout_secs),
        }
    }
}

/// Reviewer decision on a set of photos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl std::str::FromStr for ReviewAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            other => Err(Error::InvalidState(format!(
                "Unknown review action '{}': expected approve or reject",
                other
            ))),
        }
    }
}

/// Result of any review operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewOutcome {
    /// Photos of the booking matched by the request
    pub affected: usize,
    pub stats: PhotoStats,
    pub delivery_status: DeliveryStatus,
    pub booking_ready: bool,
}

#[derive(Clone)]
pub struct AssetService {
    store: Arc<dyn AssetStore>,
    gateway: UrlGateway,
    sink: Arc<dyn NotificationSink>,
    config: AssetsConfig,
}

impl AssetService {
    pub fn new(
        store: Arc<dyn AssetStore>,
        gateway: UrlGateway,
        sink: Arc<dyn NotificationSink>,
        config: AssetsConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            sink,
            config,
        }
    }

    #[mutants::skip] // Plain accessor
    pub fn store(&self) -> &Arc<dyn AssetStore> {
        &self.store
    }

    #[mutants::skip] // Plain accessor
    pub fn config(&self) -> &AssetsConfig {
        &self.config
    }

    /// Load a booking the caller may see; out-of-scope bookings are reported
    /// as missing.
    async fn scoped_booking(&self, ctx: &AuthContext, booking_id: Uuid) -> Result<BookingAssets> {
        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or_else(booking_not_found)?;
        ensure_scope(ctx, &booking)?;
        Ok(booking)
    }
}

fn booking_not_found() -> Error {
    Error::NotFound("Booking not found".to_string())
}

/// Studio scope check; a violation does not reveal that the booking exists
fn ensure_scope(ctx: &AuthContext, booking: &BookingAssets) -> Result<()> {
    if ctx.can_access_studio(booking.studio_id) {
        Ok(())
    } else {
        Err(booking_not_found())
    }
}

fn ensure_reviewer(ctx: &AuthContext) -> Result<()> {
    if ctx.can_review() {
        Ok(())
    } else {
        Err(Error::Authorization(
            "Reviewer role required for this action".to_string(),
        ))
    }
}

/// Lock a booking inside `tx` and check the caller's scope
async fn lock_scoped_booking(
    tx: &mut dyn AssetTx,
    ctx: &AuthContext,
    booking_id: Uuid,
) -> Result<BookingAssets> {
    let booking = tx
        .lock_booking(booking_id)
        .await?
        .ok_or_else(booking_not_found)?;
    ensure_scope(ctx, &booking)?;
    Ok(booking)
}

/// Recompute and persist the booking projection inside `tx`.
///
/// `event` is the batch move made in this transaction, if any.
async fn reproject(
    tx: &mut dyn AssetTx,
    booking: &BookingAssets,
    event: Option<UploadEvent>,
) -> Result<Projection> {
    let photos = tx.photos_for_booking(booking.id).await?;
    let projection = BookingProjector::project(booking, event, &photos);

    if projection.assets_status != booking.assets_status
        || projection.delivery_status != booking.delivery_status
    {
        tx.update_booking_status(
            booking.id,
            projection.assets_status,
            projection.delivery_status,
        )
        .await?;
        tracing::info!(
            booking_id = %booking.id,
            assets_status = ?projection.assets_status,
            delivery_status = ?projection.delivery_status,
            "Booking projection updated"
        );
    }

    Ok(projection)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for service tests

    use std::sync::Arc;

    use rust_decimal::Decimal;
    use uuid::Uuid;

    use shutterdesk_auth::{AuthContext, StaffRole};
    use shutterdesk_notify::mock::MockNotificationSink;
    use shutterdesk_storage::hmac_signer::HmacUrlSigner;
    use shutterdesk_storage::UrlGateway;

    use super::{AssetService, AssetsConfig};
    use crate::domain::entities::{AssetsStatus, BookingAssets, DeliveryStatus, Photo};
    use crate::repository::memory::MemoryAssetStore;
    use crate::repository::AssetStore;

    pub struct Fixture {
        pub service: AssetService,
        pub store: MemoryAssetStore,
        pub sink: MockNotificationSink,
        pub studio_id: Uuid,
        pub booking_id: Uuid,
    }

    impl Fixture {
        pub async fn new() -> Self {
            Self::with_config(AssetsConfig::default()).await
        }

        pub async fn with_config(config: AssetsConfig) -> Self {
            let store = MemoryAssetStore::new();
            let sink = MockNotificationSink::new();
            let signer =
                HmacUrlSigner::new("https://cdn.test".to_string(), b"test-secret".to_vec())
                    .unwrap();
            let service = AssetService::new(
                Arc::new(store.clone()),
                UrlGateway::with_defaults(Arc::new(signer)),
                Arc::new(sink.clone()),
                config,
            );

            let studio_id = Uuid::new_v4();
            let booking_id = Uuid::new_v4();
            store
                .insert_booking(BookingAssets {
                    id: booking_id,
                    studio_id,
                    client_name: Some("Ada Obi".to_string()),
                    client_email: Some("ada@example.com".to_string()),
                    client_phone: Some("+2348000000000".to_string()),
                    assets_status: AssetsStatus::NotUploaded,
                    delivery_status: DeliveryStatus::Editing,
                })
                .await;

            Self {
                service,
                store,
                sink,
                studio_id,
                booking_id,
            }
        }

        pub fn staff(&self, role: StaffRole) -> AuthContext {
            AuthContext::new(Uuid::new_v4(), self.studio_id, role)
        }

        pub fn reviewer(&self) -> AuthContext {
            self.staff(StaffRole::Reviewer)
        }

        pub fn outsider(&self) -> AuthContext {
            AuthContext::new(Uuid::new_v4(), Uuid::new_v4(), StaffRole::Manager)
        }

        pub async fn booking(&self) -> BookingAssets {
            self.store
                .find_booking(self.booking_id)
                .await
                .unwrap()
                .unwrap()
        }

        pub async fn photo(&self, id: Uuid) -> Photo {
            self.store.find_photo(id).await.unwrap().unwrap()
        }

        /// Open a batch, register `count` photos and close it as fully uploaded
        pub async fn uploaded_photos(&self, count: i32) -> (Uuid, Vec<Uuid>) {
            let ctx = self.reviewer();
            let batch = self
                .service
                .create_batch(&ctx, self.booking_id, count, None)
                .await
                .unwrap();
            let mut ids = Vec::new();
            for i in 0..count {
                let upload = self
                    .service
                    .register_upload(
                        &ctx,
                        batch.id,
                        &format!("IMG_{:04}.jpg", i),
                        2048,
                        "image/jpeg",
                    )
                    .await
                    .unwrap();
                ids.push(upload.photo.id);
            }
            self.service
                .complete_batch(&ctx, batch.id, count, 0)
                .await
                .unwrap();
            (batch.id, ids)
        }

        /// Price the booking and record payments
        pub async fn bill(&self, due: i64, paid: i64) {
            self.store
                .add_line_item(self.booking_id, Decimal::from(due), 1)
                .await;
            if paid > 0 {
                self.store
                    .add_payment(self.booking_id, Decimal::from(paid), true)
                    .await;
            }
        }
    }
}
