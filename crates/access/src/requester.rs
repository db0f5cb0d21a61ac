//! Verified request identity

use dms_model::{RoleId, UserId};
use serde::{Deserialize, Serialize};

/// The (user, role, privileged) triple supplied by the identity provider.
///
/// The evaluator trusts these values completely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requester {
    pub user_id: UserId,
    pub role_id: RoleId,
    /// Holds the privileged ("overlord") role
    pub privileged: bool,
}

impl Requester {
    /// Create a non-privileged requester
    pub fn new(user_id: UserId, role_id: RoleId) -> Self {
        Self {
            user_id,
            role_id,
            privileged: false,
        }
    }

    /// Create a requester holding the privileged role
    pub fn privileged(user_id: UserId, role_id: RoleId) -> Self {
        Self {
            user_id,
            role_id,
            privileged: true,
        }
    }

    /// Check whether this requester owns a document
    pub fn owns(&self, owner_id: UserId) -> bool {
        self.user_id == owner_id
    }
}
