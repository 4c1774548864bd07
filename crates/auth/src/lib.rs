//! Caller context for the Shutterdesk API
//!
//! Identity and role resolution happen upstream; this crate only validates
//! the bearer JWT that carries an already-resolved `{role, studio_id, user_id}`
//! and exposes axum extractors that work with any domain state implementing
//! `FromRef<S>` for `AuthBackend`.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod jwt;
mod role;

pub use backend::AuthBackend;
pub use claims::StaffClaims;
pub use config::AuthConfig;
pub use context::AuthContext;
pub use error::AuthError;
pub use extractors::{AdminUser, AuthUser, ReviewerUser};
pub use role::StaffRole;
