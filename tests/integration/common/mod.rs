//! Common test utilities and fixtures for integration tests
//!
//! Each `TestApp` is a full router over a fresh in-memory store, an HMAC
//! signer and a mock notification sink, with one seeded booking. Requests go
//! through `tower::ServiceExt::oneshot`; callers authenticate with JWTs minted
//! against the test secret.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use shutterdesk_assets::{
    AssetService, AssetsConfig, AssetsState, AssetsStatus, BookingAssets, DeliveryStatus,
    MemoryAssetStore,
};
use shutterdesk_auth::{AuthBackend, AuthConfig, StaffClaims, StaffRole};
use shutterdesk_notify::mock::MockNotificationSink;
use shutterdesk_storage::hmac_signer::HmacUrlSigner;
use shutterdesk_storage::UrlGateway;

pub const JWT_SECRET: &str = "integration-test-secret"; // pragma: allowlist secret

/// A staff caller: id, studio and role, plus a bearer token for them
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: Uuid,
    pub studio_id: Uuid,
    pub role: StaffRole,
    pub token: String,
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryAssetStore,
    pub sink: MockNotificationSink,
    pub studio_id: Uuid,
    pub booking_id: Uuid,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = MemoryAssetStore::new();
        let sink = MockNotificationSink::new();
        let signer = HmacUrlSigner::new(
            "https://cdn.shutterdesk.test".to_string(),
            b"integration-signing-secret".to_vec(),
        )
        .expect("signer");

        let service = AssetService::new(
            Arc::new(store.clone()),
            UrlGateway::with_defaults(Arc::new(signer)),
            Arc::new(sink.clone()),
            AssetsConfig::default(),
        );
        let auth = AuthBackend::new(AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
            issuer: None,
            audience: None,
        });
        let router = shutterdesk_app::router(AssetsState { service, auth });

        let studio_id = Uuid::new_v4();
        let booking_id = Uuid::new_v4();
        store
            .insert_booking(BookingAssets {
                id: booking_id,
                studio_id,
                client_name: Some("Chioma Eze".to_string()),
                client_email: Some("chioma@example.com".to_string()),
                client_phone: Some("+2348030000000".to_string()),
                assets_status: AssetsStatus::NotUploaded,
                delivery_status: DeliveryStatus::Editing,
            })
            .await;

        Self {
            router,
            store,
            sink,
            studio_id,
            booking_id,
        }
    }

    /// Caller in the seeded booking's studio
    pub fn staff(&self, role: StaffRole) -> Caller {
        caller(self.studio_id, role)
    }

    pub fn reviewer(&self) -> Caller {
        self.staff(StaffRole::Reviewer)
    }

    /// Administrator from another studio; may act across studios
    pub fn administrator(&self) -> Caller {
        caller(Uuid::new_v4(), StaffRole::Administrator)
    }

    /// Manager of some other studio
    pub fn outsider(&self) -> Caller {
        caller(Uuid::new_v4(), StaffRole::Manager)
    }

    /// Price the booking and record completed payments
    pub async fn bill(&self, due: i64, paid: i64) {
        self.store
            .add_line_item(self.booking_id, Decimal::from(due), 1)
            .await;
        if paid > 0 {
            self.store
                .add_payment(self.booking_id, Decimal::from(paid), true)
                .await;
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        caller: Option<&Caller>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", caller.token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str, caller: Option<&Caller>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, caller, None).await
    }

    pub async fn post(&self, uri: &str, caller: &Caller, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(caller), Some(body)).await
    }

    /// Open a batch, register `count` files and close it as fully uploaded.
    ///
    /// Returns the batch id and the photo ids in upload order.
    pub async fn upload_photos(&self, caller: &Caller, count: i32) -> (Uuid, Vec<Uuid>) {
        let (status, batch) = self
            .post(
                &format!("/v1/bookings/{}/batches", self.booking_id),
                caller,
                serde_json::json!({ "total_files": count }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", batch);
        let batch_id = uuid_at(&batch, "/id");

        let mut photo_ids = Vec::new();
        for i in 0..count {
            let (status, registered) = self
                .post(
                    &format!("/v1/batches/{}/photos", batch_id),
                    caller,
                    serde_json::json!({
                        "file_name": format!("DSC_{:04}.jpg", i),
                        "file_size": 3_145_728,
                        "mime_type": "image/jpeg",
                    }),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{}", registered);
            photo_ids.push(uuid_at(&registered, "/photo/id"));
        }

        let (status, closed) = self
            .post(
                &format!("/v1/batches/{}/complete", batch_id),
                caller,
                serde_json::json!({ "uploaded_files": count, "failed_files": 0 }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", closed);

        (batch_id, photo_ids)
    }

    pub async fn booking_status(&self) -> (AssetsStatus, DeliveryStatus) {
        let booking = shutterdesk_assets::AssetStore::find_booking(&self.store, self.booking_id)
            .await
            .expect("store")
            .expect("seeded booking");
        (booking.assets_status, booking.delivery_status)
    }
}

pub fn caller(studio_id: Uuid, role: StaffRole) -> Caller {
    let user_id = Uuid::new_v4();
    let now = chrono::Utc::now().timestamp() as u64;
    let claims = StaffClaims {
        sub: user_id.to_string(),
        studio_id: studio_id.to_string(),
        role,
        email: Some(format!("staff_{}@shutterdesk.test", user_id.simple())),
        iat: now,
        exp: now + 3600,
        aud: None,
        iss: None,
    };
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("jwt");

    Caller {
        user_id,
        studio_id,
        role,
        token,
    }
}

/// Read a UUID at a JSON pointer
pub fn uuid_at(value: &Value, pointer: &str) -> Uuid {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("no uuid at {} in {}", pointer, value))
}

pub fn error_code(value: &Value) -> &str {
    value
        .pointer("/error/code")
        .and_then(Value::as_str)
        .unwrap_or_default()
}
