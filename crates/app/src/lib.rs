//! Shutterdesk application composition root
//!
//! Builds the store, URL signer and notification sink from configuration and
//! composes the domain routers into a single application.

use std::sync::Arc;

use axum::{http::HeaderValue, Router};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};

use shutterdesk_assets::{
    AssetService, AssetStore, AssetsConfig, AssetsState, MemoryAssetStore, PgAssetStore,
};
use shutterdesk_auth::{AuthBackend, AuthConfig};
use shutterdesk_common::Config;
use shutterdesk_notify::{NotificationSinkFactory, NotifyConfig};
use shutterdesk_storage::{SignerFactory, StorageConfig, UrlGateway};

/// Request bodies are small JSON documents; photo bytes go straight to storage
const MAX_BODY_BYTES: usize = 256 * 1024;

/// Pick the asset store: Postgres when `DATABASE_URL` is set, in-memory otherwise
pub async fn build_store(config: &Config) -> Result<Arc<dyn AssetStore>, anyhow::Error> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using the in-memory asset store");
        return Ok(Arc::new(MemoryAssetStore::new()));
    };

    let pool = PgPool::connect(database_url)
        .await
        .map_err(|e| anyhow::anyhow!("Database connection failed: {}", e))?;
    tracing::info!("Database connection established");

    if config.run_migrations {
        sqlx::migrate!("../../migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    Ok(Arc::new(PgAssetStore::new(pool)))
}

/// Build the Assets domain state from configuration
pub async fn build_state(config: &Config) -> Result<AssetsState, anyhow::Error> {
    let auth = AuthBackend::new(AuthConfig {
        jwt_secret: config.jwt_secret.clone(),
        issuer: config.jwt_issuer.clone(),
        audience: config.jwt_audience.clone(),
    });

    let store = build_store(config).await?;

    let storage_config = StorageConfig::from_env()?;
    let signer = SignerFactory::create(&storage_config).await?;
    let gateway = UrlGateway::new(Arc::from(signer), &storage_config);

    let sink = NotificationSinkFactory::create(NotifyConfig::from_env()?).await?;

    let service = AssetService::new(store, gateway, Arc::from(sink), AssetsConfig::from(config));

    Ok(AssetsState { service, auth })
}

/// Compose the domain routers with the shared infrastructure routes
pub fn router(state: AssetsState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Shutterdesk API v0.0.1-SNAPSHOT" }),
        )
        .merge(shutterdesk_assets::routes().with_state(state))
}

/// Create the main application router with all routes
pub async fn create_app(config: &Config) -> Result<Router, anyhow::Error> {
    Ok(router(build_state(config).await?))
}

/// CORS layer from a comma-separated origin list; `*` allows any origin
pub fn build_cors_layer(origins: &str) -> CorsLayer {
    let origins = origins.trim();
    if origins == "*" {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

pub fn body_limit_layer() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(MAX_BODY_BYTES)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
