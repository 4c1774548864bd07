//! Delivery token handlers
//!
//! `issue_delivery_token` is staff-only; the two delivery reads are public
//! and authorized by the token in the path.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use shutterdesk_auth::ReviewerUser;
use shutterdesk_common::{OptionalJson, Result};

use crate::api::middleware::AssetsState;
use crate::service::{DeliverablePhoto, DownloadGrant, IssuedDeliveryToken};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct IssueDeliveryTokenRequest {
    /// Token lifetime, 14 days when omitted
    #[validate(range(min = 1, max = 90))]
    #[serde(default)]
    pub valid_for_days: Option<i64>,
}

pub async fn issue_delivery_token(
    ReviewerUser(ctx): ReviewerUser,
    State(state): State<AssetsState>,
    Path(booking_id): Path<Uuid>,
    OptionalJson(request): OptionalJson<IssueDeliveryTokenRequest>,
) -> Result<(StatusCode, Json<IssuedDeliveryToken>)> {
    let issued = state
        .service
        .issue_delivery_token(&ctx, booking_id, request.valid_for_days)
        .await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

/// Photos available under a delivery token
pub async fn list_deliverable(
    State(state): State<AssetsState>,
    Path(token): Path<String>,
) -> Result<Json<Vec<DeliverablePhoto>>> {
    Ok(Json(state.service.list_deliverable(&token).await?))
}

/// Download URL for one photo under a delivery token
pub async fn resolve_download(
    State(state): State<AssetsState>,
    Path((token, photo_id)): Path<(String, Uuid)>,
) -> Result<Json<DownloadGrant>> {
    Ok(Json(state.service.resolve_download(&token, photo_id).await?))
}
