//! Client delivery integration tests
//!
//! - POST /v1/bookings/{id}/delivery-tokens
//! - GET  /v1/deliveries/{token}
//! - GET  /v1/deliveries/{token}/photos/{photoId}

mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use shutterdesk_auth::StaffRole;

use common::{error_code, TestApp};

/// Approve `count` fresh uploads and issue a delivery token
async fn approved_with_token(app: &TestApp, count: i32) -> (Vec<Uuid>, String) {
    let reviewer = app.reviewer();
    let (_, ids) = app.upload_photos(&reviewer, count).await;
    let (status, _) = app
        .post(
            &format!("/v1/bookings/{}/photos/review", app.booking_id),
            &reviewer,
            json!({ "action": "approve", "photo_ids": ids }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            &format!("/v1/bookings/{}/delivery-tokens", app.booking_id),
            &reviewer,
            json!({ "valid_for_days": 7 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (ids, body["token"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_issue_token_requires_reviewer() {
    let app = TestApp::new().await;
    let (status, _) = app
        .post(
            &format!("/v1/bookings/{}/delivery-tokens", app.booking_id),
            &app.staff(StaffRole::Other),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            &format!("/v1/bookings/{}/delivery-tokens", app.booking_id),
            &app.reviewer(),
            json!({ "valid_for_days": 365 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_paid_booking_download_records_bookkeeping() {
    let app = TestApp::new().await;
    app.bill(120_000, 120_000).await;
    let (ids, token) = approved_with_token(&app, 2).await;

    let (status, listing) = app.get(&format!("/v1/deliveries/{}", token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing.as_array().unwrap().len(), 2);

    let (status, grant) = app
        .get(
            &format!("/v1/deliveries/{}/photos/{}", token, ids[0]),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", grant);
    assert_eq!(grant["download_count"], 1);
    assert!(grant["url"].as_str().unwrap().contains("method=GET"));

    let (_, grant) = app
        .get(
            &format!("/v1/deliveries/{}/photos/{}", token, ids[0]),
            None,
        )
        .await;
    assert_eq!(grant["download_count"], 2);

    let (_, photos) = app
        .get(
            &format!("/v1/bookings/{}/photos", app.booking_id),
            Some(&app.reviewer()),
        )
        .await;
    let downloaded = photos["photos"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == ids[0].to_string())
        .unwrap();
    assert_eq!(downloaded["client_downloaded"], true);
    assert!(downloaded["client_downloaded_at"].is_string());
}

#[tokio::test]
async fn test_outstanding_balance_is_payment_required() {
    let app = TestApp::new().await;
    app.bill(25_000, 20_000).await;
    let (ids, token) = approved_with_token(&app, 1).await;

    let (status, body) = app
        .get(
            &format!("/v1/deliveries/{}/photos/{}", token, ids[0]),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(error_code(&body), "PAYMENT_REQUIRED");
    assert_eq!(body["error"]["balance"], "5000");
}

#[tokio::test]
async fn test_unknown_token_and_unapproved_photo_not_found() {
    let app = TestApp::new().await;
    let (_, token) = approved_with_token(&app, 1).await;
    let (_, pending) = app.upload_photos(&app.reviewer(), 1).await;

    let (status, _) = app.get("/v1/deliveries/not-a-real-token", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .get(
            &format!("/v1/deliveries/{}/photos/{}", token, pending[0]),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_issue_token_without_body_uses_default_lifetime() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/v1/bookings/{}/delivery-tokens", app.booking_id),
            Some(&app.reviewer()),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let expires_at: DateTime<Utc> = body["expires_at"].as_str().unwrap().parse().unwrap();
    let lifetime = expires_at - Utc::now();
    assert!(lifetime > Duration::days(13) && lifetime <= Duration::days(14));
}
