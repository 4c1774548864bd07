//! Staff roles as resolved by the identity provider

use serde::{Deserialize, Serialize};

/// Role carried in the caller's token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Administrator,
    Manager,
    Reviewer,
    /// Photographers, assistants and any other studio staff
    #[serde(other)]
    Other,
}

impl StaffRole {
    /// Check if this role may approve or reject photos
    pub fn can_review(&self) -> bool {
        matches!(
            self,
            StaffRole::Administrator | StaffRole::Manager | StaffRole::Reviewer
        )
    }

    /// Check if this role may act across studios
    pub fn is_administrator(&self) -> bool {
        matches!(self, StaffRole::Administrator)
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaffRole::Administrator => write!(f, "administrator"),
            StaffRole::Manager => write!(f, "manager"),
            StaffRole::Reviewer => write!(f, "reviewer"),
            StaffRole::Other => write!(f, "other"),
        }
    }
}
