//! Concrete authentication backend
//!
//! Holds the injected `AuthConfig` and turns a validated bearer token into
//! an `AuthContext`. No identity lookups happen here: the token already
//! carries the resolved role and studio.

use uuid::Uuid;

use crate::config::AuthConfig;
use crate::context::AuthContext;
use crate::error::AuthError;

/// Concrete authentication backend.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone, Debug)]
pub struct AuthBackend {
    config: AuthConfig,
}

impl AuthBackend {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Validate a bearer token and build the caller context
    pub fn authenticate_jwt(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = crate::jwt::validate_jwt_token(token, &self.config)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidUserId)?;
        let studio_id =
            Uuid::parse_str(&claims.studio_id).map_err(|_| AuthError::InvalidStudioId)?;

        tracing::debug!(user_id = %user_id, studio_id = %studio_id, role = %claims.role, "Caller authenticated");

        Ok(AuthContext {
            user_id,
            studio_id,
            role: claims.role,
            email: claims.email,
        })
    }
}
