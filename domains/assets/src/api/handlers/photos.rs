//! Photo listing, review and staff retrieval handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use shutterdesk_auth::{AuthUser, ReviewerUser};
use shutterdesk_common::{OptionalJson, Pagination, Result, ValidatedJson};

use crate::api::middleware::AssetsState;
use crate::domain::entities::ProcessingStatus;
use crate::service::{PhotoListing, ReviewAction, ReviewOutcome, StaffPhotoUrl};

#[derive(Debug, Deserialize)]
pub struct PhotoFilter {
    pub processing_status: Option<ProcessingStatus>,
}

/// Approve or reject a set of photos
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    /// `approve` or `reject`; parsed by the handler so an unknown action is
    /// reported as an invalid state rather than a malformed body
    pub action: String,

    #[validate(length(min = 1, max = 1000))]
    pub photo_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ApproveAllRequest {
    #[serde(default)]
    pub batch_id: Option<Uuid>,
}

/// Edited rendition reported by the editing workflow
#[derive(Debug, Deserialize, Validate)]
pub struct MarkEditedRequest {
    #[validate(length(min = 1, max = 1024))]
    pub edited_key: String,

    #[validate(length(min = 1, max = 1024))]
    pub thumbnail_key: Option<String>,
}

/// List a booking's photos with summary stats
pub async fn list_photos(
    AuthUser(ctx): AuthUser,
    State(state): State<AssetsState>,
    Path(booking_id): Path<Uuid>,
    Query(filter): Query<PhotoFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<PhotoListing>> {
    let listing = state
        .service
        .list_photos(&ctx, booking_id, filter.processing_status)
        .await?;
    Ok(Json(PhotoListing {
        photos: page.window(listing.photos),
        stats: listing.stats,
    }))
}

pub async fn review_photos(
    ReviewerUser(ctx): ReviewerUser,
    State(state): State<AssetsState>,
    Path(booking_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<ReviewRequest>,
) -> Result<Json<ReviewOutcome>> {
    let action: ReviewAction = request.action.parse()?;
    let outcome = state
        .service
        .review(&ctx, booking_id, action, &request.photo_ids)
        .await?;
    Ok(Json(outcome))
}

pub async fn approve_all(
    ReviewerUser(ctx): ReviewerUser,
    State(state): State<AssetsState>,
    Path(booking_id): Path<Uuid>,
    OptionalJson(request): OptionalJson<ApproveAllRequest>,
) -> Result<Json<ReviewOutcome>> {
    let outcome = state
        .service
        .approve_all(&ctx, booking_id, request.batch_id)
        .await?;
    Ok(Json(outcome))
}

pub async fn mark_edited(
    ReviewerUser(ctx): ReviewerUser,
    State(state): State<AssetsState>,
    Path(photo_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<MarkEditedRequest>,
) -> Result<Json<ReviewOutcome>> {
    let outcome = state
        .service
        .mark_edited(
            &ctx,
            photo_id,
            &request.edited_key,
            request.thumbnail_key.as_deref(),
        )
        .await?;
    Ok(Json(outcome))
}

/// One-hour signed URL for staff
pub async fn staff_photo_url(
    AuthUser(ctx): AuthUser,
    State(state): State<AssetsState>,
    Path(photo_id): Path<Uuid>,
) -> Result<Json<StaffPhotoUrl>> {
    Ok(Json(state.service.staff_photo_url(&ctx, photo_id).await?))
}
