//! Roles and users
//!
//! Roles are immutable reference data. The registry knows which role title
//! is privileged.

use crate::{RoleId, UserId};
use serde::{Deserialize, Serialize};

/// Title of the privileged role unless configured otherwise
pub const DEFAULT_PRIVILEGED_ROLE: &str = "overlord";

/// A role that users hold and documents can be shared with
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub title: String,
}

impl Role {
    pub fn new(id: impl Into<RoleId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A registered user. Each user holds exactly one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role_id: RoleId,
}

/// The set of known roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistry {
    roles: Vec<Role>,
    privileged_title: String,
}

impl RoleRegistry {
    /// Create a registry from reference data
    pub fn new(roles: Vec<Role>, privileged_title: impl Into<String>) -> Self {
        Self {
            roles,
            privileged_title: privileged_title.into(),
        }
    }

    /// Look up a role by id
    pub fn get(&self, id: RoleId) -> Option<&Role> {
        self.roles.iter().find(|role| role.id == id)
    }

    /// Look up a role by title (case-insensitive)
    pub fn find_by_title(&self, title: &str) -> Option<&Role> {
        self.roles
            .iter()
            .find(|role| role.title.eq_ignore_ascii_case(title))
    }

    pub fn contains(&self, id: RoleId) -> bool {
        self.get(id).is_some()
    }

    pub fn privileged_title(&self) -> &str {
        &self.privileged_title
    }

    /// Whether a role title names the privileged role
    pub fn is_privileged_title(&self, title: &str) -> bool {
        title.eq_ignore_ascii_case(&self.privileged_title)
    }

    /// Whether the role with this id is the privileged role
    pub fn is_privileged(&self, id: RoleId) -> bool {
        self.get(id)
            .map(|role| self.is_privileged_title(&role.title))
            .unwrap_or(false)
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new(
            vec![
                Role::new(1, DEFAULT_PRIVILEGED_ROLE),
                Role::new(2, "admin"),
                Role::new(3, "editor"),
                Role::new(4, "author"),
                Role::new(5, "reviewer"),
                Role::new(6, "reader"),
            ],
            DEFAULT_PRIVILEGED_ROLE,
        )
    }
}
