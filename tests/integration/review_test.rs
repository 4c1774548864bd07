//! Review and approval endpoint integration tests
//!
//! - POST /v1/bookings/{id}/photos/review
//! - POST /v1/bookings/{id}/photos/approve-all
//! - POST /v1/photos/{id}/edited
//! - GET  /v1/photos/{id}/url

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use shutterdesk_assets::DeliveryStatus;
use shutterdesk_auth::StaffRole;

use common::{error_code, uuid_at, TestApp};

#[tokio::test]
async fn test_review_requires_reviewer_role() {
    let app = TestApp::new().await;
    let (_, ids) = app.upload_photos(&app.reviewer(), 1).await;

    let (status, body) = app
        .post(
            &format!("/v1/bookings/{}/photos/review", app.booking_id),
            &app.staff(StaffRole::Other),
            json!({ "action": "approve", "photo_ids": ids }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "FORBIDDEN");
}

#[tokio::test]
async fn test_unknown_action_is_invalid_state() {
    let app = TestApp::new().await;
    let (_, ids) = app.upload_photos(&app.reviewer(), 1).await;

    let (status, body) = app
        .post(
            &format!("/v1/bookings/{}/photos/review", app.booking_id),
            &app.reviewer(),
            json!({ "action": "publish", "photo_ids": ids }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "INVALID_STATE");
}

#[tokio::test]
async fn test_approve_twice_is_idempotent() {
    let app = TestApp::new().await;
    let reviewer = app.reviewer();
    let (_, ids) = app.upload_photos(&reviewer, 2).await;
    let uri = format!("/v1/bookings/{}/photos/review", app.booking_id);
    let request = json!({ "action": "approve", "photo_ids": [ids[0]] });

    let (status, first) = app.post(&uri, &reviewer, request.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = app.post(&uri, &reviewer, request).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(first, second);
    assert_eq!(second["affected"], 1);
    assert_eq!(second["stats"]["approved"], 1);
    assert_eq!(second["booking_ready"], false);
}

#[tokio::test]
async fn test_approve_reject_round_trip() {
    let app = TestApp::new().await;
    let reviewer = app.reviewer();
    let (batch_id, ids) = app.upload_photos(&reviewer, 2).await;
    let uri = format!("/v1/bookings/{}/photos/review", app.booking_id);

    let (_, body) = app
        .post(&uri, &reviewer, json!({ "action": "approve", "photo_ids": ids }))
        .await;
    assert_eq!(body["booking_ready"], true);
    assert_eq!(body["delivery_status"], "READY");
    assert_eq!(app.booking_status().await.1, DeliveryStatus::Ready);

    let (status, body) = app
        .post(&uri, &reviewer, json!({ "action": "reject", "photo_ids": [ids[1]] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking_ready"], false);
    assert_eq!(body["stats"]["editing"], 1);
    assert_eq!(app.booking_status().await.1, DeliveryStatus::Editing);

    let (_, batch) = app
        .get(&format!("/v1/batches/{}", batch_id), Some(&reviewer))
        .await;
    assert_eq!(batch["status"], "COMPLETED");
}

#[tokio::test]
async fn test_approve_all_edited_photos_readies_booking() {
    let app = TestApp::new().await;
    let reviewer = app.reviewer();
    let (batch_id, ids) = app.upload_photos(&reviewer, 3).await;
    for id in &ids {
        let (status, _) = app
            .post(
                &format!("/v1/photos/{}/edited", id),
                &reviewer,
                json!({
                    "edited_key": format!("bookings/{}/edited/{}.jpg", app.booking_id, id),
                    "thumbnail_key": format!("bookings/{}/thumbs/{}.jpg", app.booking_id, id),
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app
        .post(
            &format!("/v1/bookings/{}/photos/approve-all", app.booking_id),
            &reviewer,
            json!({}),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["affected"], 3);
    assert_eq!(body["stats"]["approved"], 3);
    assert_eq!(body["delivery_status"], "READY");

    let (_, listing) = app
        .get(
            &format!("/v1/bookings/{}/photos", app.booking_id),
            Some(&reviewer),
        )
        .await;
    for photo in listing["photos"].as_array().unwrap() {
        assert_eq!(photo["processing_status"], "APPROVED");
        assert_eq!(photo["status"], "READY");
    }
    let (_, batch) = app
        .get(&format!("/v1/batches/{}", batch_id), Some(&reviewer))
        .await;
    assert_eq!(batch["status"], "COMPLETED");
}

#[tokio::test]
async fn test_approve_all_unknown_batch_not_found() {
    let app = TestApp::new().await;
    let reviewer = app.reviewer();
    app.upload_photos(&reviewer, 1).await;

    let (status, _) = app
        .post(
            &format!("/v1/bookings/{}/photos/approve-all", app.booking_id),
            &reviewer,
            json!({ "batch_id": uuid::Uuid::new_v4() }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mark_edited_rejects_foreign_prefix() {
    let app = TestApp::new().await;
    let reviewer = app.reviewer();
    let (_, ids) = app.upload_photos(&reviewer, 1).await;

    let (status, body) = app
        .post(
            &format!("/v1/photos/{}/edited", ids[0]),
            &reviewer,
            json!({ "edited_key": "bookings/someone-else/edited/a.jpg" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_staff_photo_url() {
    let app = TestApp::new().await;
    let (_, ids) = app.upload_photos(&app.reviewer(), 1).await;

    let (status, body) = app
        .get(
            &format!("/v1/photos/{}/url", ids[0]),
            Some(&app.staff(StaffRole::Other)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uuid_at(&body, "/photo_id"), ids[0]);
    assert!(body["url"]
        .as_str()
        .unwrap()
        .starts_with("https://cdn.shutterdesk.test/bookings/"));

    let (status, _) = app
        .get(&format!("/v1/photos/{}/url", ids[0]), Some(&app.outsider()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_approve_all_without_body() {
    let app = TestApp::new().await;
    let reviewer = app.reviewer();
    app.upload_photos(&reviewer, 2).await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/v1/bookings/{}/photos/approve-all", app.booking_id),
            Some(&reviewer),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["affected"], 2);
    assert_eq!(body["booking_ready"], true);
}
