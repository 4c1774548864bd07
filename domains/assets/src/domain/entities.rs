//! Asset domain entities for Shutterdesk
//!
//! Photos, upload batches, delivery tokens and the slice of the booking
//! aggregate this pipeline reads and writes.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shutterdesk_common::{Error, Result, StateError};

use crate::domain::state::{BatchCompletion, PhotoReviewMachine, ReviewEvent};

/// Longest file name accepted on upload
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Longest batch note
pub const MAX_NOTES_LEN: usize = 2000;

/// Editorial review state of a photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "processing_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    #[default]
    Editing,
    Edited,
    Approved,
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Editing => write!(f, "EDITING"),
            Self::Edited => write!(f, "EDITED"),
            Self::Approved => write!(f, "APPROVED"),
        }
    }
}

/// Delivery-facing state of a photo, derived from `ProcessingStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "photo_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhotoStatus {
    #[default]
    Processing,
    Ready,
    Delivered,
}

impl PhotoStatus {
    /// Status implied by an editorial state.
    ///
    /// DELIVERED is set outside this pipeline and survives re-approval.
    pub fn derive(processing: ProcessingStatus, current: PhotoStatus) -> Self {
        match (processing, current) {
            (ProcessingStatus::Approved, PhotoStatus::Delivered) => PhotoStatus::Delivered,
            (ProcessingStatus::Approved, _) => PhotoStatus::Ready,
            _ => PhotoStatus::Processing,
        }
    }

    pub fn is_deliverable(&self) -> bool {
        matches!(self, Self::Ready | Self::Delivered)
    }
}

/// Upload batch status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "batch_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    #[default]
    NotYet,
    InReview,
    Completed,
    Failed,
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotYet => write!(f, "NOT_YET"),
            Self::InReview => write!(f, "IN_REVIEW"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Booking-level upload progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "assets_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetsStatus {
    #[default]
    NotUploaded,
    Uploading,
    Uploaded,
}

/// Booking-level delivery progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "delivery_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Editing,
    Ready,
    Delivered,
}

/// Photo entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Photo {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub batch_id: Option<Uuid>,
    pub uploader_id: Uuid,
    pub object_key: String,
    pub edited_key: Option<String>,
    pub thumbnail_key: Option<String>,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub processing_status: ProcessingStatus,
    pub status: PhotoStatus,
    pub expires_at: DateTime<Utc>,
    pub expiration_warning_sent: bool,
    pub client_downloaded: bool,
    pub client_downloaded_at: Option<DateTime<Utc>>,
    pub download_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a reported upload, validated by `Photo::new`
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub batch_id: Uuid,
    pub uploader_id: Uuid,
    pub object_key: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
}

impl Photo {
    /// Create a photo for a reported upload, retained for `retention_days`
    pub fn new(new: NewPhoto, retention_days: i64) -> Result<Self> {
        validate_upload(&new.file_name, new.file_size, &new.mime_type)?;
        if retention_days <= 0 {
            return Err(Error::Configuration(
                "Photo retention must be at least one day".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Photo {
            id: new.id,
            booking_id: new.booking_id,
            batch_id: Some(new.batch_id),
            uploader_id: new.uploader_id,
            object_key: new.object_key,
            edited_key: None,
            thumbnail_key: None,
            file_name: new.file_name,
            file_size: new.file_size,
            mime_type: new.mime_type.to_ascii_lowercase(),
            processing_status: ProcessingStatus::Editing,
            status: PhotoStatus::Processing,
            expires_at: now + Duration::days(retention_days),
            expiration_warning_sent: false,
            client_downloaded: false,
            client_downloaded_at: None,
            download_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a review event; returns whether anything changed.
    ///
    /// `status` is always rederived so it cannot drift from the editorial state.
    pub fn apply(&mut self, event: ReviewEvent) -> std::result::Result<bool, StateError> {
        let next = PhotoReviewMachine::transition(self.processing_status, event)?;
        let status = PhotoStatus::derive(next, self.status);
        let changed = next != self.processing_status || status != self.status;
        if changed {
            self.processing_status = next;
            self.status = status;
            self.updated_at = Utc::now();
        }
        Ok(changed)
    }

    /// Object key served on retrieval: the edited rendition when present
    pub fn retrieval_key(&self) -> &str {
        self.edited_key.as_deref().unwrap_or(&self.object_key)
    }

    pub fn is_approved(&self) -> bool {
        self.processing_status == ProcessingStatus::Approved
    }

    /// Client download bookkeeping
    pub fn record_download(&mut self, at: DateTime<Utc>) {
        self.download_count = self.download_count.saturating_add(1);
        self.client_downloaded = true;
        self.client_downloaded_at = Some(at);
        self.updated_at = at;
    }
}

/// Validate the client-reported fields of an upload
pub fn validate_upload(file_name: &str, file_size: i64, mime_type: &str) -> Result<()> {
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("File name cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_FILE_NAME_LEN {
        return Err(Error::Validation(format!(
            "File name cannot exceed {} characters",
            MAX_FILE_NAME_LEN
        )));
    }
    if file_size <= 0 {
        return Err(Error::Validation(
            "File size must be greater than zero".to_string(),
        ));
    }

    let mime = mime_type.to_ascii_lowercase();
    let is_media = mime
        .split_once('/')
        .map(|(kind, sub)| matches!(kind, "image" | "video") && !sub.is_empty())
        .unwrap_or(false);
    if !is_media {
        return Err(Error::Validation(format!(
            "Unsupported MIME type '{}': only image/* and video/* are accepted",
            mime_type
        )));
    }
    Ok(())
}

/// Upload batch entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UploadBatch {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub uploader_id: Uuid,
    pub total_files: i32,
    pub uploaded_files: i32,
    pub failed_files: i32,
    pub status: BatchStatus,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UploadBatch {
    /// Open a new upload session for `total_files` files
    pub fn new(
        booking_id: Uuid,
        uploader_id: Uuid,
        total_files: i32,
        notes: Option<String>,
    ) -> Result<Self> {
        if total_files <= 0 {
            return Err(Error::Validation(
                "Total files must be greater than zero".to_string(),
            ));
        }
        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if notes
            .as_ref()
            .is_some_and(|n| n.chars().count() > MAX_NOTES_LEN)
        {
            return Err(Error::Validation(format!(
                "Notes cannot exceed {} characters",
                MAX_NOTES_LEN
            )));
        }

        let now = Utc::now();
        Ok(UploadBatch {
            id: Uuid::new_v4(),
            booking_id,
            uploader_id,
            total_files,
            uploaded_files: 0,
            failed_files: 0,
            status: BatchStatus::NotYet,
            notes,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == BatchStatus::NotYet
    }

    /// Close the batch with the client-reported counts
    pub fn complete(&mut self, uploaded_files: i32, failed_files: i32) -> Result<BatchStatus> {
        let status = BatchCompletion::complete(
            self.status,
            self.total_files,
            uploaded_files,
            failed_files,
        )?;

        let now = Utc::now();
        self.uploaded_files = uploaded_files;
        self.failed_files = failed_files;
        self.status = status;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(status)
    }

    /// Promote to COMPLETED once every photo of the booking is approved.
    ///
    /// Returns whether the batch changed.
    pub fn promote_on_all_approved(&mut self) -> bool {
        let next = BatchCompletion::promote_on_all_approved(self.status);
        if next == self.status {
            return false;
        }
        self.status = next;
        self.updated_at = Utc::now();
        true
    }
}

/// Batch with the number of photos registered against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BatchSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub batch: UploadBatch,
    pub photo_count: i64,
}

/// Asset-facing slice of the external booking aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookingAssets {
    pub id: Uuid,
    pub studio_id: Uuid,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub assets_status: AssetsStatus,
    pub delivery_status: DeliveryStatus,
}

/// Stored delivery token; only the hash of the raw token is kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryToken {
    pub id: Uuid,
    pub booking_id: Uuid,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl DeliveryToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Money owed and paid on a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentSummary {
    /// Sum of line-item price × quantity
    pub total_due: Decimal,
    /// Sum of completed payments
    pub total_paid: Decimal,
}

impl PaymentSummary {
    pub fn is_paid_in_full(&self) -> bool {
        self.total_paid >= self.total_due
    }

    /// Outstanding amount, never negative
    pub fn balance(&self) -> Decimal {
        (self.total_due - self.total_paid).max(Decimal::ZERO)
    }
}

/// Photo counts by editorial state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PhotoStats {
    pub total: i64,
    pub editing: i64,
    pub edited: i64,
    pub approved: i64,
}

impl PhotoStats {
    pub fn from_photos<'a>(photos: impl IntoIterator<Item = &'a Photo>) -> Self {
        photos
            .into_iter()
            .fold(PhotoStats::default(), |mut stats, photo| {
                stats.total += 1;
                match photo.processing_status {
                    ProcessingStatus::Editing => stats.editing += 1,
                    ProcessingStatus::Edited => stats.edited += 1,
                    ProcessingStatus::Approved => stats.approved += 1,
                }
                stats
            })
    }
}
