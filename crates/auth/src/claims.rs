//! JWT claims types

use serde::{Deserialize, Serialize};

use crate::role::StaffRole;

/// Claims minted by the identity service once role and studio are resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Studio the caller belongs to
    pub studio_id: String,
    /// Resolved staff role
    pub role: StaffRole,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
    /// Issued at
    pub iat: u64,
    /// Expires at
    pub exp: u64,
    /// Audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}
