//! Assets domain state and auth backend integration

use axum::extract::FromRef;
use shutterdesk_auth::AuthBackend;

use crate::service::AssetService;

/// Application state for the Assets domain
#[derive(Clone)]
pub struct AssetsState {
    pub service: AssetService,
    pub auth: AuthBackend,
}

impl FromRef<AssetsState> for AuthBackend {
    fn from_ref(state: &AssetsState) -> Self {
        state.auth.clone()
    }
}
