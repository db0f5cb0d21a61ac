//! Role grants for shared documents

use crate::{DocumentId, ModelError, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Right carried by a role grant.
///
/// Grants only ever confer read access. The code is kept for storage
/// compatibility with existing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GrantRight {
    /// Read-only access
    Read = 3,
}

impl GrantRight {
    /// Stored numeric code
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl Default for GrantRight {
    fn default() -> Self {
        GrantRight::Read
    }
}

impl TryFrom<u8> for GrantRight {
    type Error = ModelError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            3 => Ok(GrantRight::Read),
            other => Err(ModelError::InvalidGrantRight(other)),
        }
    }
}

impl From<GrantRight> for u8 {
    fn from(right: GrantRight) -> Self {
        right.code()
    }
}

/// A single document/role association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessGrant {
    pub document_id: DocumentId,
    pub role_id: RoleId,
    pub right: GrantRight,
}

/// The roles permitted to read a shared document.
///
/// Serializes as a map from role id to right code, e.g. `{"6": 3}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantSet(BTreeMap<RoleId, GrantRight>);

impl GrantSet {
    /// Create an empty grant set
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a grant set giving read access to each role
    pub fn read_for<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = RoleId>,
    {
        Self(roles.into_iter().map(|role| (role, GrantRight::Read)).collect())
    }

    /// Add or overwrite a grant
    pub fn insert(&mut self, role: RoleId, right: GrantRight) {
        self.0.insert(role, right);
    }

    /// Check whether the role holds a grant
    pub fn contains_role(&self, role: RoleId) -> bool {
        self.0.contains_key(&role)
    }

    /// Right held by the role, if any
    pub fn right_for(&self, role: RoleId) -> Option<GrantRight> {
        self.0.get(&role).copied()
    }

    /// Return a copy without the given role
    pub fn without_role(&self, role: RoleId) -> Self {
        let mut grants = self.0.clone();
        grants.remove(&role);
        Self(grants)
    }

    /// Granted roles in ascending order
    pub fn roles(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoleId, GrantRight)> + '_ {
        self.0.iter().map(|(role, right)| (*role, *right))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Expand into join rows for the given document
    pub fn to_grants(&self, document_id: DocumentId) -> Vec<AccessGrant> {
        self.iter()
            .map(|(role_id, right)| AccessGrant {
                document_id,
                role_id,
                right,
            })
            .collect()
    }
}

impl FromIterator<(RoleId, GrantRight)> for GrantSet {
    fn from_iter<T: IntoIterator<Item = (RoleId, GrantRight)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
