//! Route definitions for Assets domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{batches, delivery, photos, sweeps};
use super::middleware::AssetsState;

/// Create all Assets domain API routes
pub fn routes() -> Router<AssetsState> {
    Router::new()
        .route(
            "/v1/bookings/{id}/batches",
            post(batches::create_batch).get(batches::list_batches),
        )
        .route("/v1/batches/{id}", get(batches::get_batch))
        .route("/v1/batches/{id}/photos", post(batches::register_upload))
        .route("/v1/batches/{id}/complete", post(batches::complete_batch))
        .route("/v1/bookings/{id}/photos", get(photos::list_photos))
        .route("/v1/bookings/{id}/photos/review", post(photos::review_photos))
        .route(
            "/v1/bookings/{id}/photos/approve-all",
            post(photos::approve_all),
        )
        .route("/v1/photos/{id}/edited", post(photos::mark_edited))
        .route("/v1/photos/{id}/url", get(photos::staff_photo_url))
        .route(
            "/v1/bookings/{id}/delivery-tokens",
            post(delivery::issue_delivery_token),
        )
        .route("/v1/deliveries/{token}", get(delivery::list_deliverable))
        .route(
            "/v1/deliveries/{token}/photos/{photo_id}",
            get(delivery::resolve_download),
        )
        .route(
            "/v1/internal/sweeps/expiring-photos",
            post(sweeps::sweep_expiring_photos),
        )
}
