//! Expiry-warning sweep integration tests
//!
//! - POST /v1/internal/sweeps/expiring-photos

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};

use shutterdesk_auth::StaffRole;
use shutterdesk_notify::Channel;

use common::{uuid_at, TestApp};

const SWEEP: &str = "/v1/internal/sweeps/expiring-photos";

#[tokio::test]
async fn test_sweep_requires_administrator() {
    let app = TestApp::new().await;
    let manager = app.staff(StaffRole::Manager);
    let (status, _) = app.send(Method::POST, SWEEP, Some(&manager), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_sweep_warns_once_and_survives_failures() {
    let app = TestApp::new().await;
    let (_, ids) = app.upload_photos(&app.reviewer(), 2).await;
    app.store
        .set_photo_expiry(ids[0], Utc::now() + Duration::days(2))
        .await
        .unwrap();
    app.store
        .set_photo_expiry(ids[1], Utc::now() + Duration::days(20))
        .await
        .unwrap();
    app.sink.fail_channel(Channel::Email);
    app.sink.fail_channel(Channel::Sms);
    let admin = app.administrator();

    let (status, report) = app
        .send(
            Method::POST,
            &format!("{}?horizon_days=3", SWEEP),
            Some(&admin),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", report);
    assert_eq!(report["scanned"], 1);
    let result = &report["results"][0];
    assert_eq!(uuid_at(result, "/photo_id"), ids[0]);
    assert_eq!(result["outcome"], "FAILED");

    app.sink.reset();
    let (_, report) = app
        .send(
            Method::POST,
            &format!("{}?horizon_days=3", SWEEP),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(report["scanned"], 0);
}

#[tokio::test]
async fn test_sweep_notifies_client() {
    let app = TestApp::new().await;
    let (_, ids) = app.upload_photos(&app.reviewer(), 1).await;
    app.store
        .set_photo_expiry(ids[0], Utc::now() + Duration::days(1))
        .await
        .unwrap();

    let (status, report) = app
        .send(Method::POST, SWEEP, Some(&app.administrator()), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["horizon_days"], 3);
    assert_eq!(report["results"][0]["outcome"], "NOTIFIED");
    let captured = app.sink.captured_for_photo(ids[0]);
    assert_eq!(captured.len(), 1);
    assert_eq!(
        captured[0].notification.recipient.email.as_deref(),
        Some("chioma@example.com")
    );
}

#[tokio::test]
async fn test_sweep_rejects_wide_horizon() {
    let app = TestApp::new().await;
    let (status, _) = app
        .send(
            Method::POST,
            &format!("{}?horizon_days=90", SWEEP),
            Some(&app.administrator()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
