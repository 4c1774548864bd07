//! Upload Batch Tracker

use serde::Serialize;
use uuid::Uuid;

use shutterdesk_auth::AuthContext;
use shutterdesk_common::{Error, Result};
use shutterdesk_storage::{keys, SignedUrl};

use super::{lock_scoped_booking, reproject, AssetService};
use crate::domain::projection::UploadEvent;
use crate::domain::entities::{
    validate_upload, BatchSummary, NewPhoto, Photo, PhotoStats, ProcessingStatus, UploadBatch,
};

/// A registered upload and where to PUT its bytes
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredUpload {
    pub photo: Photo,
    pub upload: SignedUrl,
}

/// Photos of a booking with counts by editorial state
#[derive(Debug, Clone, Serialize)]
pub struct PhotoListing {
    pub photos: Vec<Photo>,
    pub stats: PhotoStats,
}

fn batch_not_found() -> Error {
    Error::NotFound("Batch not found".to_string())
}

/// An out-of-scope booking behind a batch reads as a missing batch
fn hide_booking(err: Error) -> Error {
    match err {
        Error::NotFound(_) => batch_not_found(),
        other => other,
    }
}

/// Only the batch's uploader or a reviewer may report on it
fn ensure_uploader_or_reviewer(ctx: &AuthContext, batch: &UploadBatch) -> Result<()> {
    if ctx.user_id == batch.uploader_id || ctx.can_review() {
        Ok(())
    } else {
        Err(Error::Authorization(
            "Only the batch uploader or a reviewer may report on this batch".to_string(),
        ))
    }
}

fn ensure_open(batch: &UploadBatch) -> Result<()> {
    if batch.is_open() {
        Ok(())
    } else {
        Err(Error::InvalidState(format!(
            "Batch is {}; uploads can only be registered while it is open",
            batch.status
        )))
    }
}

impl AssetService {
    /// Open an upload session of `total_files` files for a booking
    pub async fn create_batch(
        &self,
        ctx: &AuthContext,
        booking_id: Uuid,
        total_files: i32,
        notes: Option<String>,
    ) -> Result<UploadBatch> {
        let batch = UploadBatch::new(booking_id, ctx.user_id, total_files, notes)?;

        let mut tx = self.store.begin().await?;
        let booking = lock_scoped_booking(tx.as_mut(), ctx, booking_id).await?;
        tx.insert_batch(&batch).await?;
        reproject(tx.as_mut(), &booking, Some(UploadEvent::BatchOpened)).await?;
        tx.commit().await?;

        tracing::info!(
            batch_id = %batch.id,
            booking_id = %booking_id,
            total_files,
            "Upload batch created"
        );
        Ok(batch)
    }

    /// Record one successfully uploaded file and issue its object key
    pub async fn register_upload(
        &self,
        ctx: &AuthContext,
        batch_id: Uuid,
        file_name: &str,
        file_size: i64,
        mime_type: &str,
    ) -> Result<RegisteredUpload> {
        validate_upload(file_name, file_size, mime_type)?;

        let batch = self
            .store
            .find_batch(batch_id)
            .await?
            .ok_or_else(batch_not_found)?;
        self.scoped_booking(ctx, batch.booking_id)
            .await
            .map_err(hide_booking)?;
        ensure_uploader_or_reviewer(ctx, &batch)?;
        ensure_open(&batch)?;

        let photo_id = Uuid::new_v4();
        let object_key = keys::photo_object_key(batch.booking_id, batch.id, photo_id, file_name)?;
        let photo = Photo::new(
            NewPhoto {
                id: photo_id,
                booking_id: batch.booking_id,
                batch_id: batch.id,
                uploader_id: ctx.user_id,
                object_key,
                file_name: file_name.trim().to_string(),
                file_size,
                mime_type: mime_type.to_string(),
            },
            self.config.photo_retention_days,
        )?;

        // Signed before the transaction; a failed write just means the URL is never returned
        let upload = self.gateway.upload_url(&photo.object_key).await?;

        let mut tx = self.store.begin().await?;
        let booking = lock_scoped_booking(tx.as_mut(), ctx, batch.booking_id).await?;
        let batch = tx.find_batch(batch_id).await?.ok_or_else(batch_not_found)?;
        ensure_open(&batch)?;
        let registered = tx
            .photos_for_booking(batch.booking_id)
            .await?
            .iter()
            .filter(|p| p.batch_id == Some(batch.id))
            .count();
        if registered >= batch.total_files as usize {
            return Err(Error::InvalidState(format!(
                "Batch already holds all {} declared files",
                batch.total_files
            )));
        }
        tx.insert_photo(&photo).await?;
        reproject(tx.as_mut(), &booking, None).await?;
        tx.commit().await?;

        tracing::info!(
            photo_id = %photo.id,
            batch_id = %batch_id,
            booking_id = %photo.booking_id,
            file_size,
            "Upload registered"
        );
        Ok(RegisteredUpload { photo, upload })
    }

    /// Close a batch with the client-reported counts
    pub async fn complete_batch(
        &self,
        ctx: &AuthContext,
        batch_id: Uuid,
        uploaded_files: i32,
        failed_files: i32,
    ) -> Result<UploadBatch> {
        let booking_id = self
            .store
            .find_batch(batch_id)
            .await?
            .ok_or_else(batch_not_found)?
            .booking_id;

        let mut tx = self.store.begin().await?;
        let booking = lock_scoped_booking(tx.as_mut(), ctx, booking_id)
            .await
            .map_err(hide_booking)?;
        let mut batch = tx.find_batch(batch_id).await?.ok_or_else(batch_not_found)?;
        ensure_uploader_or_reviewer(ctx, &batch)?;

        let status = batch.complete(uploaded_files, failed_files)?;
        tx.update_batch(&batch).await?;
        let projection = reproject(
            tx.as_mut(),
            &booking,
            Some(UploadEvent::BatchClosed(status)),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            batch_id = %batch_id,
            booking_id = %booking_id,
            uploaded_files,
            failed_files,
            status = %status,
            assets_status = ?projection.assets_status,
            "Upload batch completed"
        );
        Ok(batch)
    }

    /// Batches of a booking, newest first, with photo counts
    pub async fn list_batches(
        &self,
        ctx: &AuthContext,
        booking_id: Uuid,
    ) -> Result<Vec<BatchSummary>> {
        self.scoped_booking(ctx, booking_id).await?;
        self.store.list_batches(booking_id).await
    }

    pub async fn get_batch(&self, ctx: &AuthContext, batch_id: Uuid) -> Result<BatchSummary> {
        let summary = self
            .store
            .find_batch_summary(batch_id)
            .await?
            .ok_or_else(batch_not_found)?;
        self.scoped_booking(ctx, summary.batch.booking_id)
            .await
            .map_err(hide_booking)?;
        Ok(summary)
    }

    /// Photos of a booking, optionally filtered; stats always cover every photo
    pub async fn list_photos(
        &self,
        ctx: &AuthContext,
        booking_id: Uuid,
        processing_status: Option<ProcessingStatus>,
    ) -> Result<PhotoListing> {
        self.scoped_booking(ctx, booking_id).await?;
        let photos = self.store.list_photos(booking_id, processing_status).await?;
        let stats = self.store.photo_stats(booking_id).await?;
        Ok(PhotoListing { photos, stats })
    }
}
