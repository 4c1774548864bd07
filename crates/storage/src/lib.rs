//! Shutterdesk Object Key/URL Gateway
//!
//! Byte transfer happens out-of-band between clients and object storage; this
//! crate only issues object keys and signs URLs for them:
//! - `keys`: deterministic, booking-scoped object key issuance
//! - `ObjectSigner`: one signing contract with a caller-supplied expiry
//! - `hmac_signer`: local HMAC-SHA256 signing for a CDN/edge that verifies it
//! - `s3`: AWS S3 presigned URLs (local SigV4 computation, no network call)
//! - `gateway`: audience-parameterized resolution (internal staff vs. paid client)

use std::time::Duration;

use thiserror::Error;

pub mod gateway;
pub mod hmac_signer;
pub mod keys;
pub mod s3;

pub use gateway::{SignedUrl, UrlAudience, UrlGateway};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage configuration error: {0}")]
    Configuration(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Signing timed out after {0:?}")]
    Timeout(Duration),

    #[error("Access window has closed: {0}")]
    Expired(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for shutterdesk_common::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Configuration(msg) => shutterdesk_common::Error::Configuration(msg),
            StorageError::InvalidKey(msg) => shutterdesk_common::Error::Validation(msg),
            StorageError::Signing(msg) => shutterdesk_common::Error::Transient(msg),
            StorageError::Expired(msg) => shutterdesk_common::Error::Gone(msg),
            StorageError::Timeout(after) => shutterdesk_common::Error::Transient(format!(
                "URL signing timed out after {}s",
                after.as_secs()
            )),
        }
    }
}

/// HTTP method a signed URL is valid for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedMethod {
    Get,
    Put,
}

impl std::fmt::Display for SignedMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignedMethod::Get => write!(f, "GET"),
            SignedMethod::Put => write!(f, "PUT"),
        }
    }
}

/// Signing contract shared by every storage backend
#[async_trait::async_trait]
pub trait ObjectSigner: Send + Sync {
    /// Sign `key` for `method`, valid for `expires_in` from now
    async fn sign(
        &self,
        key: &str,
        method: SignedMethod,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Short provider name for logs
    fn provider(&self) -> &'static str;
}

/// Storage configuration
#[derive(Clone)]
pub struct StorageConfig {
    /// Signing provider (hmac, s3)
    pub provider: String,
    /// Bucket holding booking assets
    pub bucket: String,
    /// Base URL of the edge that serves HMAC-signed URLs
    pub public_base_url: String,
    /// Shared secret for HMAC signing
    pub signing_secret: Option<String>,
    /// AWS region for S3
    pub aws_region: Option<String>,
    /// AWS endpoint URL (for LocalStack / MinIO)
    pub aws_endpoint_url: Option<String>,
    /// Lifetime of staff retrieval URLs
    pub internal_ttl: Duration,
    /// Upper bound on client retrieval URLs, further capped by the delivery token
    pub public_max_ttl: Duration,
    /// Lifetime of upload (PUT) URLs
    pub upload_ttl: Duration,
    /// Bound on a single signing call
    pub timeout: Duration,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("provider", &self.provider)
            .field("bucket", &self.bucket)
            .field("public_base_url", &self.public_base_url)
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "<redacted>"))
            .field("aws_region", &self.aws_region)
            .field("aws_endpoint_url", &self.aws_endpoint_url)
            .field("internal_ttl", &self.internal_ttl)
            .field("public_max_ttl", &self.public_max_ttl)
            .finish()
    }
}

/// Staff retrieval URLs live for one hour
pub const DEFAULT_INTERNAL_TTL: Duration = Duration::from_secs(60 * 60);

/// Client retrieval URLs never live longer than a day
pub const DEFAULT_PUBLIC_MAX_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Upload URLs live for 30 minutes
pub const DEFAULT_UPLOAD_TTL: Duration = Duration::from_secs(30 * 60);

/// Outbound calls are bounded at 15 seconds
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

impl StorageConfig {
    /// Create storage config from environment variables
    pub fn from_env() -> StorageResult<Self> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("STORAGE_PROVIDER").unwrap_or_else(|_| "hmac".to_string());
        let bucket =
            std::env::var("STORAGE_BUCKET").unwrap_or_else(|_| "shutterdesk-assets".to_string());
        let public_base_url = std::env::var("STORAGE_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:9000/shutterdesk-assets".to_string());
        let signing_secret = std::env::var("STORAGE_SIGNING_SECRET").ok();
        let aws_region = std::env::var("AWS_REGION").ok();
        let aws_endpoint_url = std::env::var("AWS_ENDPOINT_URL").ok();
        let timeout = std::env::var("OUTBOUND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(Self {
            provider,
            bucket,
            public_base_url,
            signing_secret,
            aws_region,
            aws_endpoint_url,
            internal_ttl: DEFAULT_INTERNAL_TTL,
            public_max_ttl: DEFAULT_PUBLIC_MAX_TTL,
            upload_ttl: DEFAULT_UPLOAD_TTL,
            timeout,
        })
    }
}

/// Signer factory
pub struct SignerFactory;

impl SignerFactory {
    /// Create a signer based on configuration.
    ///
    /// Missing credentials are a configuration error, never a silent fallback.
    pub async fn create(config: &StorageConfig) -> StorageResult<Box<dyn ObjectSigner>> {
        match config.provider.as_str() {
            "hmac" => {
                let secret = config.signing_secret.as_deref().ok_or_else(|| {
                    StorageError::Configuration(
                        "STORAGE_SIGNING_SECRET is required for the hmac provider".to_string(),
                    )
                })?;
                tracing::info!("Creating HMAC URL signer");
                Ok(Box::new(hmac_signer::HmacUrlSigner::new(
                    config.public_base_url.clone(),
                    secret.as_bytes().to_vec(),
                )?))
            }
            "s3" | "aws-s3" => {
                tracing::info!(bucket = %config.bucket, "Creating S3 presigning signer");
                Ok(Box::new(s3::S3UrlSigner::new(config).await?))
            }
            provider => Err(StorageError::Configuration(format!(
                "Unknown storage provider: {}. Supported providers: hmac, s3",
                provider
            ))),
        }
    }
}
