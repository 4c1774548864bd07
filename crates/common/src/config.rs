//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config. Component-specific settings
//! (storage signing, notification delivery) live with their crates and are
//! injected into those components at construction.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Default photo retention before expiry, in days
pub const DEFAULT_PHOTO_RETENTION_DAYS: i64 = 30;

/// Default look-ahead window of the expiry sweep, in days
pub const DEFAULT_EXPIRY_WARNING_HORIZON_DAYS: i64 = 3;

/// Default bound on outbound calls (signing, notification dispatch), in seconds
pub const DEFAULT_OUTBOUND_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL; `None` runs against the in-memory store
    pub database_url: Option<String>,
    pub run_migrations: bool,

    /// Bearer token verification
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,

    /// Asset lifecycle
    pub photo_retention_days: i64,
    pub expiry_warning_horizon_days: i64,
    pub outbound_timeout_secs: u64,

    /// Runtime configuration
    pub cors_allowed_origins: Option<String>,
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Self {
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            run_migrations: parse_or("RUN_MIGRATIONS", false),

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET is required"))?,
            jwt_issuer: env::var("JWT_ISSUER").ok(),
            jwt_audience: env::var("JWT_AUDIENCE").ok(),

            photo_retention_days: parse_or("PHOTO_RETENTION_DAYS", DEFAULT_PHOTO_RETENTION_DAYS),
            expiry_warning_horizon_days: parse_or(
                "EXPIRY_WARNING_HORIZON_DAYS",
                DEFAULT_EXPIRY_WARNING_HORIZON_DAYS,
            ),
            outbound_timeout_secs: parse_or("OUTBOUND_TIMEOUT_SECS", DEFAULT_OUTBOUND_TIMEOUT_SECS),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS").ok(),
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "shutterdesk=debug".to_string()),
            port: parse_or("PORT", 3000),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the asset lifecycle meaningless
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        if self.photo_retention_days <= 0 {
            anyhow::bail!("PHOTO_RETENTION_DAYS must be positive");
        }
        if self.expiry_warning_horizon_days <= 0 {
            anyhow::bail!("EXPIRY_WARNING_HORIZON_DAYS must be positive");
        }
        if self.outbound_timeout_secs == 0 {
            anyhow::bail!("OUTBOUND_TIMEOUT_SECS must be positive");
        }
        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
