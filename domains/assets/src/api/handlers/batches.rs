//! Upload batch API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use shutterdesk_auth::AuthUser;
use shutterdesk_common::{Pagination, Result, ValidatedJson};

use crate::api::middleware::AssetsState;
use crate::domain::entities::{BatchSummary, UploadBatch};
use crate::service::RegisteredUpload;

/// Request for opening an upload batch
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBatchRequest {
    /// Number of files the client intends to upload
    #[validate(range(min = 1))]
    pub total_files: i32,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Per-file success report
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUploadRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,

    #[validate(range(min = 1))]
    pub file_size: i64,

    #[validate(length(min = 1, max = 255))]
    pub mime_type: String,
}

/// Client-reported completion counters
#[derive(Debug, Deserialize, Validate)]
pub struct CompleteBatchRequest {
    #[validate(range(min = 0))]
    pub uploaded_files: i32,

    #[validate(range(min = 0))]
    pub failed_files: i32,
}

/// Open an upload batch for a booking
pub async fn create_batch(
    AuthUser(ctx): AuthUser,
    State(state): State<AssetsState>,
    Path(booking_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateBatchRequest>,
) -> Result<(StatusCode, Json<UploadBatch>)> {
    let batch = state
        .service
        .create_batch(&ctx, booking_id, request.total_files, request.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// List a booking's batches, newest first
pub async fn list_batches(
    AuthUser(ctx): AuthUser,
    State(state): State<AssetsState>,
    Path(booking_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<BatchSummary>>> {
    let batches = state.service.list_batches(&ctx, booking_id).await?;
    Ok(Json(page.window(batches)))
}

pub async fn get_batch(
    AuthUser(ctx): AuthUser,
    State(state): State<AssetsState>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<BatchSummary>> {
    Ok(Json(state.service.get_batch(&ctx, batch_id).await?))
}

/// Register one uploaded file and return its PUT URL
pub async fn register_upload(
    AuthUser(ctx): AuthUser,
    State(state): State<AssetsState>,
    Path(batch_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<RegisterUploadRequest>,
) -> Result<(StatusCode, Json<RegisteredUpload>)> {
    let registered = state
        .service
        .register_upload(
            &ctx,
            batch_id,
            &request.file_name,
            request.file_size,
            &request.mime_type,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

/// Close a batch with its reported counters
pub async fn complete_batch(
    AuthUser(ctx): AuthUser,
    State(state): State<AssetsState>,
    Path(batch_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CompleteBatchRequest>,
) -> Result<Json<UploadBatch>> {
    let batch = state
        .service
        .complete_batch(&ctx, batch_id, request.uploaded_files, request.failed_files)
        .await?;
    Ok(Json(batch))
}
