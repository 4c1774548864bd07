//! AWS S3 presigned URLs
//!
//! Presigning is a local SigV4 computation; no request leaves the process.
//! Works with LocalStack/MinIO through `AWS_ENDPOINT_URL`.

use std::time::Duration;

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::SharedCredentialsProvider;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client as S3Client;

use crate::{keys, ObjectSigner, SignedMethod, StorageConfig, StorageError, StorageResult};

pub struct S3UrlSigner {
    client: S3Client,
    bucket: String,
}

impl S3UrlSigner {
    pub async fn new(config: &StorageConfig) -> StorageResult<Self> {
        let region = config
            .aws_region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let client = match config.aws_endpoint_url.as_ref() {
            Some(endpoint_url) => {
                tracing::info!("Using custom S3 endpoint: {}", endpoint_url);

                let credentials = Credentials::new(
                    "test-access-key",
                    "test-secret-key",
                    None,
                    None,
                    "localstack-storage-provider",
                );
                let aws_config = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region))
                    .credentials_provider(SharedCredentialsProvider::new(credentials))
                    .load()
                    .await;

                let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
                    .endpoint_url(endpoint_url)
                    .force_path_style(true)
                    .build();
                S3Client::from_conf(s3_config)
            }
            None => {
                let aws_config = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region))
                    .load()
                    .await;
                if aws_config.credentials_provider().is_none() {
                    return Err(StorageError::Configuration(
                        "No AWS credentials available for S3 presigning".to_string(),
                    ));
                }
                S3Client::new(&aws_config)
            }
        };

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait::async_trait]
impl ObjectSigner for S3UrlSigner {
    async fn sign(
        &self,
        key: &str,
        method: SignedMethod,
        expires_in: Duration,
    ) -> StorageResult<String> {
        keys::validate_key(key)?;

        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::Signing(format!("Invalid presign expiry: {}", e)))?;

        let request = match method {
            SignedMethod::Get => self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .presigned(presigning)
                .await
                .map_err(|e| StorageError::Signing(e.to_string()))?,
            SignedMethod::Put => self
                .client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .presigned(presigning)
                .await
                .map_err(|e| StorageError::Signing(e.to_string()))?,
        };

        tracing::debug!(key = %key, method = %method, "Presigned S3 URL");
        Ok(request.uri().to_string())
    }

    fn provider(&self) -> &'static str {
        "s3"
    }
}
