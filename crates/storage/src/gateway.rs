//! Audience-parameterized URL resolution.
//!
//! Staff and paying clients go through the same signer; only the lifetime
//! differs. A client URL never outlives the delivery token it was issued under.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    ObjectSigner, SignedMethod, StorageConfig, StorageError, StorageResult, DEFAULT_INTERNAL_TTL,
    DEFAULT_PUBLIC_MAX_TTL, DEFAULT_TIMEOUT, DEFAULT_UPLOAD_TTL,
};

/// Who the URL is handed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlAudience {
    /// Authenticated staff
    Internal,
    /// Client holding a valid delivery token for a paid booking
    PublicPaid { token_expires_at: DateTime<Utc> },
}

/// A signed URL and the instant it stops working
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct UrlGateway {
    signer: Arc<dyn ObjectSigner>,
    internal_ttl: Duration,
    public_max_ttl: Duration,
    upload_ttl: Duration,
    timeout: Duration,
}

impl UrlGateway {
    pub fn new(signer: Arc<dyn ObjectSigner>, config: &StorageConfig) -> Self {
        Self {
            signer,
            internal_ttl: config.internal_ttl,
            public_max_ttl: config.public_max_ttl,
            upload_ttl: config.upload_ttl,
            timeout: config.timeout,
        }
    }

    /// Gateway with the default lifetimes and timeout
    pub fn with_defaults(signer: Arc<dyn ObjectSigner>) -> Self {
        Self {
            signer,
            internal_ttl: DEFAULT_INTERNAL_TTL,
            public_max_ttl: DEFAULT_PUBLIC_MAX_TTL,
            upload_ttl: DEFAULT_UPLOAD_TTL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the outbound timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Lifetime of a retrieval URL for `audience` at `now`
    pub fn ttl_for(&self, audience: UrlAudience, now: DateTime<Utc>) -> StorageResult<Duration> {
        match audience {
            UrlAudience::Internal => Ok(self.internal_ttl),
            UrlAudience::PublicPaid { token_expires_at } => {
                let remaining = (token_expires_at - now).to_std().map_err(|_| {
                    StorageError::Expired("delivery token has expired".to_string())
                })?;
                if remaining.is_zero() {
                    return Err(StorageError::Expired(
                        "delivery token has expired".to_string(),
                    ));
                }
                Ok(remaining.min(self.public_max_ttl))
            }
        }
    }

    /// Signed GET URL for `key`
    pub async fn resolve(&self, key: &str, audience: UrlAudience) -> StorageResult<SignedUrl> {
        let now = Utc::now();
        let ttl = self.ttl_for(audience, now)?;
        self.sign_bounded(key, SignedMethod::Get, ttl, now).await
    }

    /// Signed PUT URL for the out-of-band upload of `key`
    pub async fn upload_url(&self, key: &str) -> StorageResult<SignedUrl> {
        self.sign_bounded(key, SignedMethod::Put, self.upload_ttl, Utc::now())
            .await
    }

    async fn sign_bounded(
        &self,
        key: &str,
        method: SignedMethod,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> StorageResult<SignedUrl> {
        let url = tokio::time::timeout(self.timeout, self.signer.sign(key, method, ttl))
            .await
            .map_err(|_| {
                tracing::warn!(
                    key = %key,
                    provider = self.signer.provider(),
                    "URL signing timed out"
                );
                StorageError::Timeout(self.timeout)
            })??;

        let expires_at = now
            + chrono::Duration::from_std(ttl).map_err(|e| StorageError::Signing(e.to_string()))?;

        Ok(SignedUrl { url, expires_at })
    }
}
