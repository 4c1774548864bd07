//! HMAC-SHA256 URL signing for an edge that verifies signatures itself.
//!
//! URL shape: `{base}/{key}?method=GET&expires={unix}&signature={hex}` where the
//! signature covers `"{method}\n{key}\n{expires}"`.

use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{keys, ObjectSigner, SignedMethod, StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

pub struct HmacUrlSigner {
    base_url: String,
    secret: Vec<u8>,
}

impl HmacUrlSigner {
    pub fn new(base_url: String, secret: Vec<u8>) -> StorageResult<Self> {
        if secret.is_empty() {
            return Err(StorageError::Configuration(
                "URL signing secret must not be empty".to_string(),
            ));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            secret,
        })
    }

    fn mac(&self, method: SignedMethod, key: &str, expires: i64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| StorageError::Configuration(e.to_string()))?;
        mac.update(format!("{}\n{}\n{}", method, key, expires).as_bytes());
        Ok(mac)
    }

    /// Build the signed URL for an absolute expiry (unix seconds)
    pub fn sign_until(
        &self,
        key: &str,
        method: SignedMethod,
        expires: i64,
    ) -> StorageResult<String> {
        keys::validate_key(key)?;
        let signature = hex::encode(self.mac(method, key, expires)?.finalize().into_bytes());
        Ok(format!(
            "{}/{}?method={}&expires={}&signature={}",
            self.base_url, key, method, expires, signature
        ))
    }

    /// Check a signature the way the serving edge does
    pub fn verify(
        &self,
        key: &str,
        method: SignedMethod,
        expires: i64,
        signature: &str,
        now: i64,
    ) -> bool {
        if now > expires {
            return false;
        }
        let Ok(tag) = hex::decode(signature) else {
            return false;
        };
        match self.mac(method, key, expires) {
            Ok(mac) => mac.verify_slice(&tag).is_ok(),
            Err(_) => false,
        }
    }
}

#[async_trait::async_trait]
impl ObjectSigner for HmacUrlSigner {
    async fn sign(
        &self,
        key: &str,
        method: SignedMethod,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let ttl = chrono::Duration::from_std(expires_in)
            .map_err(|e| StorageError::Signing(e.to_string()))?;
        let expires = (Utc::now() + ttl).timestamp();
        self.sign_until(key, method, expires)
    }

    fn provider(&self) -> &'static str {
        "hmac"
    }
}
