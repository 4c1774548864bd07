//! Operational trigger for the expiry-warning sweep

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use shutterdesk_auth::AdminUser;
use shutterdesk_common::Result;

use crate::api::middleware::AssetsState;
use crate::service::SweepReport;

#[derive(Debug, Deserialize)]
pub struct SweepParams {
    pub horizon_days: Option<i64>,
}

/// Run one sweep; invoked by an external scheduler
pub async fn sweep_expiring_photos(
    AdminUser(ctx): AdminUser,
    State(state): State<AssetsState>,
    Query(params): Query<SweepParams>,
) -> Result<Json<SweepReport>> {
    tracing::info!(
        triggered_by = %ctx.user_id,
        horizon_days = ?params.horizon_days,
        "Expiry-warning sweep triggered"
    );
    let report = state
        .service
        .sweep_expiring_photos(params.horizon_days)
        .await?;
    Ok(Json(report))
}
