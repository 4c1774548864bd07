//! Upload batch endpoint integration tests
//!
//! - POST /v1/bookings/{id}/batches
//! - GET  /v1/bookings/{id}/batches
//! - GET  /v1/batches/{id}
//! - POST /v1/batches/{id}/photos
//! - POST /v1/batches/{id}/complete
//! - GET  /v1/bookings/{id}/photos

mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use shutterdesk_assets::{AssetsStatus, DeliveryStatus};
use shutterdesk_auth::StaffRole;

use common::{error_code, uuid_at, TestApp};

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let (status, _) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_requires_bearer_token() {
    let app = TestApp::new().await;
    let (status, body) = app
        .get(&format!("/v1/bookings/{}/batches", app.booking_id), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "MISSING_AUTHORIZATION");
}

#[tokio::test]
async fn test_create_batch_marks_booking_uploading() {
    let app = TestApp::new().await;
    let photographer = app.staff(StaffRole::Other);

    let (status, body) = app
        .post(
            &format!("/v1/bookings/{}/batches", app.booking_id),
            &photographer,
            json!({ "total_files": 40, "notes": "ceremony, second shooter" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "NOT_YET");
    assert_eq!(body["total_files"], 40);
    assert_eq!(uuid_at(&body, "/uploader_id"), photographer.user_id);
    assert_eq!(app.booking_status().await.0, AssetsStatus::Uploading);
}

#[tokio::test]
async fn test_create_batch_rejects_zero_files() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post(
            &format!("/v1/bookings/{}/batches", app.booking_id),
            &app.reviewer(),
            json!({ "total_files": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_other_studio_sees_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post(
            &format!("/v1/bookings/{}/batches", app.booking_id),
            &app.outsider(),
            json!({ "total_files": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");

    let (status, _) = app
        .post(
            &format!("/v1/bookings/{}/batches", app.booking_id),
            &app.administrator(),
            json!({ "total_files": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_register_upload_returns_key_and_put_url() {
    let app = TestApp::new().await;
    let caller = app.staff(StaffRole::Other);
    let (_, batch) = app
        .post(
            &format!("/v1/bookings/{}/batches", app.booking_id),
            &caller,
            json!({ "total_files": 1 }),
        )
        .await;
    let batch_id = uuid_at(&batch, "/id");

    let (status, body) = app
        .post(
            &format!("/v1/batches/{}/photos", batch_id),
            &caller,
            json!({ "file_name": "../../etc/bride & groom.jpg", "file_size": 1024, "mime_type": "image/jpeg" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let photo_id = uuid_at(&body, "/photo/id");
    assert_eq!(
        body["photo"]["object_key"],
        format!(
            "bookings/{}/batches/{}/{}-bride_groom.jpg",
            app.booking_id, batch_id, photo_id
        )
    );
    assert_eq!(body["photo"]["processing_status"], "EDITING");
    assert_eq!(body["photo"]["status"], "PROCESSING");
    assert!(body["upload"]["url"]
        .as_str()
        .unwrap()
        .contains("method=PUT"));
}

#[tokio::test]
async fn test_register_upload_rejects_non_media() {
    let app = TestApp::new().await;
    let caller = app.reviewer();
    let (_, batch) = app
        .post(
            &format!("/v1/bookings/{}/batches", app.booking_id),
            &caller,
            json!({ "total_files": 1 }),
        )
        .await;

    let (status, _) = app
        .post(
            &format!("/v1/batches/{}/photos", uuid_at(&batch, "/id")),
            &caller,
            json!({ "file_name": "invoice.pdf", "file_size": 1024, "mime_type": "application/pdf" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_complete_batch_outcomes() {
    let app = TestApp::new().await;
    let caller = app.reviewer();

    let mut batch_ids = Vec::new();
    for _ in 0..2 {
        let (_, batch) = app
            .post(
                &format!("/v1/bookings/{}/batches", app.booking_id),
                &caller,
                json!({ "total_files": 5 }),
            )
            .await;
        batch_ids.push(uuid_at(&batch, "/id"));
    }

    let (status, body) = app
        .post(
            &format!("/v1/batches/{}/complete", batch_ids[0]),
            &caller,
            json!({ "uploaded_files": 0, "failed_files": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "FAILED");
    // The closing batch decides, even with a sibling still open
    assert_eq!(app.booking_status().await.0, AssetsStatus::NotUploaded);

    let (_, body) = app
        .post(
            &format!("/v1/batches/{}/complete", batch_ids[1]),
            &caller,
            json!({ "uploaded_files": 3, "failed_files": 2 }),
        )
        .await;
    assert_eq!(body["status"], "IN_REVIEW");

    let (status, body) = app
        .post(
            &format!("/v1/batches/{}/complete", batch_ids[1]),
            &caller,
            json!({ "uploaded_files": 5, "failed_files": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "INVALID_STATE");
}

#[tokio::test]
async fn test_failed_batch_leaves_booking_not_uploaded() {
    let app = TestApp::new().await;
    let caller = app.reviewer();
    let (_, batch) = app
        .post(
            &format!("/v1/bookings/{}/batches", app.booking_id),
            &caller,
            json!({ "total_files": 5 }),
        )
        .await;

    app.post(
        &format!("/v1/batches/{}/complete", uuid_at(&batch, "/id")),
        &caller,
        json!({ "uploaded_files": 0, "failed_files": 5 }),
    )
    .await;

    assert_eq!(app.booking_status().await.0, AssetsStatus::NotUploaded);
}

#[tokio::test]
async fn test_complete_batch_by_other_staff_forbidden() {
    let app = TestApp::new().await;
    let (_, batch) = app
        .post(
            &format!("/v1/bookings/{}/batches", app.booking_id),
            &app.staff(StaffRole::Other),
            json!({ "total_files": 1 }),
        )
        .await;

    let (status, body) = app
        .post(
            &format!("/v1/batches/{}/complete", uuid_at(&batch, "/id")),
            &app.staff(StaffRole::Other),
            json!({ "uploaded_files": 1, "failed_files": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "FORBIDDEN");
}

#[tokio::test]
async fn test_list_and_get_batches() {
    let app = TestApp::new().await;
    let caller = app.reviewer();
    let (first, _) = app.upload_photos(&caller, 2).await;
    let (second, _) = app.upload_photos(&caller, 1).await;

    let (status, body) = app
        .get(
            &format!("/v1/bookings/{}/batches", app.booking_id),
            Some(&caller),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let batches = body.as_array().unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(uuid_at(&batches[0], "/id"), second);
    assert_eq!(batches[0]["photo_count"], 1);
    assert_eq!(uuid_at(&batches[1], "/id"), first);
    assert_eq!(batches[1]["photo_count"], 2);

    let (status, body) = app
        .get(
            &format!("/v1/bookings/{}/batches?limit=1", app.booking_id),
            Some(&caller),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = app
        .get(&format!("/v1/batches/{}", first), Some(&caller))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");

    let (status, _) = app
        .get(&format!("/v1/batches/{}", Uuid::new_v4()), Some(&caller))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_photos_with_stats() {
    let app = TestApp::new().await;
    let caller = app.reviewer();
    let (_, ids) = app.upload_photos(&caller, 3).await;
    app.post(
        &format!("/v1/bookings/{}/photos/review", app.booking_id),
        &caller,
        json!({ "action": "approve", "photo_ids": [ids[0]] }),
    )
    .await;

    let (status, body) = app
        .get(
            &format!(
                "/v1/bookings/{}/photos?processing_status=EDITING",
                app.booking_id
            ),
            Some(&app.staff(StaffRole::Other)),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["photos"].as_array().unwrap().len(), 2);
    assert_eq!(body["stats"]["total"], 3);
    assert_eq!(body["stats"]["approved"], 1);
    assert_eq!(body["stats"]["editing"], 2);
    assert_eq!(app.booking_status().await.1, DeliveryStatus::Editing);
}
