//! Document access levels
//!
//! The numeric codes are part of the stored format and must not change.

use crate::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-document visibility policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AccessLevel {
    /// Visible to the owner only
    Private = 1,
    /// Readable by every authenticated user
    Public = 2,
    /// Readable by the roles listed in the document's grants
    Shared = 3,
}

impl AccessLevel {
    /// All access levels in code order
    pub const ALL: [AccessLevel; 3] = [AccessLevel::Private, AccessLevel::Public, AccessLevel::Shared];

    /// Stored numeric code
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Lowercase name used by the command line and logs
    pub fn name(&self) -> &'static str {
        match self {
            AccessLevel::Private => "private",
            AccessLevel::Public => "public",
            AccessLevel::Shared => "shared",
        }
    }

    /// Whether this level uses the document's role grants
    pub fn is_shared(&self) -> bool {
        matches!(self, AccessLevel::Shared)
    }
}

impl Default for AccessLevel {
    fn default() -> Self {
        AccessLevel::Public
    }
}

impl TryFrom<u8> for AccessLevel {
    type Error = ModelError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(AccessLevel::Private),
            2 => Ok(AccessLevel::Public),
            3 => Ok(AccessLevel::Shared),
            other => Err(ModelError::InvalidAccessLevel(other)),
        }
    }
}

impl From<AccessLevel> for u8 {
    fn from(level: AccessLevel) -> Self {
        level.code()
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccessLevel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" | "1" => Ok(AccessLevel::Private),
            "public" | "2" => Ok(AccessLevel::Public),
            "shared" | "3" => Ok(AccessLevel::Shared),
            _ => Err(ModelError::UnknownAccessLevel(s.to_string())),
        }
    }
}
