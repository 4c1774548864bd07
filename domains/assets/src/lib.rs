//! Assets domain: upload batches, photo review, booking projection, delivery and expiry

pub mod api;
pub mod domain;
pub mod repository;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;
pub use domain::projection::{BookingProjector, Projection, UploadEvent};
pub use domain::state::{BatchCompletion, PhotoReviewMachine, ReviewEvent};

// Re-export repository types
pub use repository::memory::MemoryAssetStore;
pub use repository::postgres::PgAssetStore;
pub use repository::{AssetStore, AssetTx};

// Re-export service types
pub use service::{
    AssetService, AssetsConfig, DeliverablePhoto, DownloadGrant, IssuedDeliveryToken,
    PhotoListing, RegisteredUpload, ReviewAction, ReviewOutcome, StaffPhotoUrl, SweepOutcome,
    SweepReport, SweepResult,
};

// Re-export API types
pub use api::routes;
pub use api::AssetsState;
