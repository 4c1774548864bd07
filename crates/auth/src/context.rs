//! Authorization context for authenticated staff

use uuid::Uuid;

use crate::role::StaffRole;

/// Resolved caller: who they are, which studio they belong to, what they may do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub studio_id: Uuid,
    pub role: StaffRole,
    pub email: Option<String>,
}

impl AuthContext {
    pub fn new(user_id: Uuid, studio_id: Uuid, role: StaffRole) -> Self {
        Self {
            user_id,
            studio_id,
            role,
            email: None,
        }
    }

    /// Check if the caller may approve or reject photos
    #[mutants::skip] // Delegates to StaffRole::can_review()
    pub fn can_review(&self) -> bool {
        self.role.can_review()
    }

    /// Check if the caller may act on records belonging to `studio_id`.
    ///
    /// Administrators may act across studios; everyone else is confined to
    /// their own studio.
    pub fn can_access_studio(&self, studio_id: Uuid) -> bool {
        self.role.is_administrator() || self.studio_id == studio_id
    }
}
