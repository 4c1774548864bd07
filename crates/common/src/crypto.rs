//! Cryptographic utilities shared across Shutterdesk crates
//!
//! Opaque bearer tokens (delivery tokens) are generated from the OS RNG and
//! stored only as a SHA-256 digest. Verification uses constant-time comparison
//! to prevent timing attacks.

use base64::Engine;
use sha2::{Digest, Sha256};

/// Number of random bytes in a generated token
pub const TOKEN_BYTES: usize = 32;

/// Generate an unguessable URL-safe token.
pub fn generate_token() -> crate::Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| crate::Error::Internal(format!("Failed to gather randomness: {}", e)))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Hex SHA-256 digest of a token, the only form persisted.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a candidate token against a stored digest using constant-time comparison.
pub fn verify_token_hash(candidate_token: &str, stored_hash: &str) -> bool {
    let stored = match hex::decode(stored_hash) {
        Ok(hash) => hash,
        Err(_) => return false,
    };

    let mut hasher = Sha256::new();
    hasher.update(candidate_token.as_bytes());
    let candidate_hash = hasher.finalize();

    if stored.len() != candidate_hash.len() {
        return false;
    }

    let mut result = 0u8;
    for (a, b) in stored.iter().zip(candidate_hash.iter()) {
        result |= a ^ b;
    }
    result == 0
}
