//! Shared utilities, configuration, and error handling for Shutterdesk
//!
//! This crate provides common functionality used across the Shutterdesk services:
//! - Configuration management following 12-factor principles
//! - The error taxonomy shared by every domain and its HTTP mapping
//! - Token generation and hashing helpers
//! - Axum extractors

pub mod config;
pub mod crypto;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::Config;
pub use crypto::{generate_token, hash_token, verify_token_hash};
pub use error::{Error, Result};
pub use extractors::{OptionalJson, Pagination, ValidatedJson};
pub use state::StateError;
