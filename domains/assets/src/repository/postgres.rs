//! Postgres-backed asset store

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use shutterdesk_common::Result;

use super::{AssetStore, AssetTx};
use crate::domain::entities::{
    AssetsStatus, BatchSummary, BookingAssets, DeliveryStatus, DeliveryToken, PaymentSummary,
    Photo, PhotoStats, ProcessingStatus, UploadBatch,
};

pub(crate) const PHOTO_COLUMNS: &str = "\
    id, booking_id, batch_id, uploader_id, object_key, edited_key, thumbnail_key, \
    file_name, file_size, mime_type, processing_status, status, expires_at, \
    expiration_warning_sent, client_downloaded, client_downloaded_at, download_count, \
    created_at, updated_at";

pub(crate) const BATCH_COLUMNS: &str = "\
    id, booking_id, uploader_id, total_files, uploaded_files, failed_files, status, notes, \
    completed_at, created_at, updated_at";

const BOOKING_COLUMNS: &str = "\
    id, studio_id, client_name, client_email, client_phone, assets_status, delivery_status";

const TOKEN_COLUMNS: &str = "id, booking_id, token_hash, expires_at, created_by, created_at";

#[derive(Clone)]
pub struct PgAssetStore {
    pool: PgPool,
}

impl PgAssetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying database pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl AssetStore for PgAssetStore {
    async fn begin(&self) -> Result<Box<dyn AssetTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgAssetTx { tx }))
    }

    async fn find_booking(&self, id: Uuid) -> Result<Option<BookingAssets>> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let row = sqlx::query_as::<_, BookingAssets>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_batch(&self, id: Uuid) -> Result<Option<UploadBatch>> {
        let query = format!("SELECT {BATCH_COLUMNS} FROM upload_batches WHERE id = $1");
        let row = sqlx::query_as::<_, UploadBatch>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_batch_summary(&self, id: Uuid) -> Result<Option<BatchSummary>> {
        let query = format!(
            "SELECT {BATCH_COLUMNS}, \
                (SELECT COUNT(*) FROM photos p WHERE p.batch_id = b.id) AS photo_count \
             FROM upload_batches b WHERE b.id = $1"
        );
        let row = sqlx::query_as::<_, BatchSummary>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_batches(&self, booking_id: Uuid) -> Result<Vec<BatchSummary>> {
        let query = format!(
            "SELECT {BATCH_COLUMNS}, \
                (SELECT COUNT(*) FROM photos p WHERE p.batch_id = b.id) AS photo_count \
             FROM upload_batches b WHERE b.booking_id = $1 \
             ORDER BY b.created_at DESC, b.id DESC"
        );
        let rows = sqlx::query_as::<_, BatchSummary>(&query)
            .bind(booking_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_photo(&self, id: Uuid) -> Result<Option<Photo>> {
        let query = format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = $1");
        let row = sqlx::query_as::<_, Photo>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_photos(
        &self,
        booking_id: Uuid,
        processing_status: Option<ProcessingStatus>,
    ) -> Result<Vec<Photo>> {
        let mut query = format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE booking_id = $1");
        if processing_status.is_some() {
            query.push_str(" AND processing_status = $2");
        }
        query.push_str(" ORDER BY created_at, id");

        let mut q = sqlx::query_as::<_, Photo>(&query).bind(booking_id);
        if let Some(status) = processing_status {
            q = q.bind(status);
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn photo_stats(&self, booking_id: Uuid) -> Result<PhotoStats> {
        let row = sqlx::query_as::<_, PhotoStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE processing_status = 'EDITING') AS editing,
                COUNT(*) FILTER (WHERE processing_status = 'EDITED') AS edited,
                COUNT(*) FILTER (WHERE processing_status = 'APPROVED') AS approved
            FROM photos WHERE booking_id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_delivery_token(&self, token_hash: &str) -> Result<Option<DeliveryToken>> {
        let query = format!("SELECT {TOKEN_COLUMNS} FROM delivery_tokens WHERE token_hash = $1");
        let row = sqlx::query_as::<_, DeliveryToken>(&query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn payment_summary(&self, booking_id: Uuid) -> Result<PaymentSummary> {
        let row = sqlx::query_as::<_, PaymentSummary>(
            r#"
            SELECT
                COALESCE((SELECT SUM(unit_price * quantity)
                          FROM booking_line_items WHERE booking_id = $1), 0)::NUMERIC AS total_due,
                COALESCE((SELECT SUM(amount)
                          FROM payments WHERE booking_id = $1 AND status = 'completed'), 0)::NUMERIC AS total_paid
            "#,
        )
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_expiring_photos(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Photo>> {
        let query = format!(
            "SELECT {PHOTO_COLUMNS} FROM photos \
             WHERE expires_at > $1 AND expires_at <= $2 AND expiration_warning_sent = false \
             ORDER BY expires_at, id"
        );
        let rows = sqlx::query_as::<_, Photo>(&query)
            .bind(now)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn claim_expiration_warning(&self, photo_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE photos
            SET expiration_warning_sent = true, updated_at = NOW()
            WHERE id = $1 AND expiration_warning_sent = false
            "#,
        )
        .bind(photo_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

pub struct PgAssetTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl AssetTx for PgAssetTx {
    async fn lock_booking(&mut self, booking_id: Uuid) -> Result<Option<BookingAssets>> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, BookingAssets>(&query)
            .bind(booking_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn find_batch(&mut self, id: Uuid) -> Result<Option<UploadBatch>> {
        let query = format!("SELECT {BATCH_COLUMNS} FROM upload_batches WHERE id = $1");
        let row = sqlx::query_as::<_, UploadBatch>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn find_photo(&mut self, id: Uuid) -> Result<Option<Photo>> {
        let query = format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = $1");
        let row = sqlx::query_as::<_, Photo>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn photos_for_booking(&mut self, booking_id: Uuid) -> Result<Vec<Photo>> {
        let query = format!(
            "SELECT {PHOTO_COLUMNS} FROM photos WHERE booking_id = $1 ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, Photo>(&query)
            .bind(booking_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn batches_for_booking(&mut self, booking_id: Uuid) -> Result<Vec<UploadBatch>> {
        let query = format!(
            "SELECT {BATCH_COLUMNS} FROM upload_batches WHERE booking_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, UploadBatch>(&query)
            .bind(booking_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn insert_batch(&mut self, batch: &UploadBatch) -> Result<()> {
        let query = format!(
            "INSERT INTO upload_batches ({BATCH_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        );
        sqlx::query(&query)
            .bind(batch.id)
            .bind(batch.booking_id)
            .bind(batch.uploader_id)
            .bind(batch.total_files)
            .bind(batch.uploaded_files)
            .bind(batch.failed_files)
            .bind(batch.status)
            .bind(&batch.notes)
            .bind(batch.completed_at)
            .bind(batch.created_at)
            .bind(batch.updated_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_batch(&mut self, batch: &UploadBatch) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE upload_batches
            SET uploaded_files = $2, failed_files = $3, status = $4,
                completed_at = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(batch.id)
        .bind(batch.uploaded_files)
        .bind(batch.failed_files)
        .bind(batch.status)
        .bind(batch.completed_at)
        .bind(batch.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_photo(&mut self, photo: &Photo) -> Result<()> {
        let query = format!(
            "INSERT INTO photos ({PHOTO_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)"
        );
        sqlx::query(&query)
            .bind(photo.id)
            .bind(photo.booking_id)
            .bind(photo.batch_id)
            .bind(photo.uploader_id)
            .bind(&photo.object_key)
            .bind(&photo.edited_key)
            .bind(&photo.thumbnail_key)
            .bind(&photo.file_name)
            .bind(photo.file_size)
            .bind(&photo.mime_type)
            .bind(photo.processing_status)
            .bind(photo.status)
            .bind(photo.expires_at)
            .bind(photo.expiration_warning_sent)
            .bind(photo.client_downloaded)
            .bind(photo.client_downloaded_at)
            .bind(photo.download_count)
            .bind(photo.created_at)
            .bind(photo.updated_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    /// Writes editorial and download fields; `expiration_warning_sent` is only
    /// ever written by `claim_expiration_warning`.
    async fn update_photo(&mut self, photo: &Photo) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE photos
            SET edited_key = $2, thumbnail_key = $3, processing_status = $4, status = $5,
                client_downloaded = $6, client_downloaded_at = $7, download_count = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(photo.id)
        .bind(&photo.edited_key)
        .bind(&photo.thumbnail_key)
        .bind(photo.processing_status)
        .bind(photo.status)
        .bind(photo.client_downloaded)
        .bind(photo.client_downloaded_at)
        .bind(photo.download_count)
        .bind(photo.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_booking_status(
        &mut self,
        booking_id: Uuid,
        assets_status: AssetsStatus,
        delivery_status: DeliveryStatus,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE bookings
            SET assets_status = $2, delivery_status = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(booking_id)
        .bind(assets_status)
        .bind(delivery_status)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_delivery_token(&mut self, token: &DeliveryToken) -> Result<()> {
        let query = format!(
            "INSERT INTO delivery_tokens ({TOKEN_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        );
        sqlx::query(&query)
            .bind(token.id)
            .bind(token.booking_id)
            .bind(&token.token_hash)
            .bind(token.expires_at)
            .bind(token.created_by)
            .bind(token.created_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
