//! Documents, drafts and patches

use crate::{AccessLevel, DocumentId, GrantSet, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    /// Rich text content, kept opaque
    pub content: String,
    pub owner_id: UserId,
    pub access: AccessLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create a document from a new-document request
    pub fn from_new(id: DocumentId, new: NewDocument) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: new.title,
            content: new.content,
            owner_id: new.owner_id,
            access: new.access,
            created_at: now,
            updated_at: now,
        }
    }

    /// The fields an editor diffs against
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            title: self.title.clone(),
            content: self.content.clone(),
            access: self.access,
        }
    }

    /// Apply the field changes of a patch. Grants are handled by the store.
    pub fn apply(&mut self, patch: &DocumentPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(access) = patch.access {
            self.access = access;
        }
        if !patch.is_empty() {
            self.updated_at = Utc::now();
        }
    }
}

/// Document fields handed to storage on creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub owner_id: UserId,
    pub access: AccessLevel,
}

/// A document together with its role grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document: Document,
    #[serde(default)]
    pub grants: GrantSet,
}

/// Create request from a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub title: String,
    pub content: String,
    pub owner_id: UserId,
    pub access: AccessLevel,
    /// Selected roles; only meaningful when `access` is shared
    #[serde(default)]
    pub roles: GrantSet,
}

/// Previously persisted editable fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub title: String,
    pub content: String,
    pub access: AccessLevel,
}

/// The editor's current values for an existing document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEdit {
    pub title: String,
    pub content: String,
    pub access: AccessLevel,
    /// Roles selected in the editor; used only when `access` is shared
    #[serde(default)]
    pub roles: GrantSet,
}

/// A minimal update: only changed fields, plus a full grant replacement
/// when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grants: Option<GrantSet>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.access.is_none()
            && self.grants.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoleId;

    fn sample() -> Document {
        Document::from_new(
            DocumentId(1),
            NewDocument {
                title: "A".to_string(),
                content: "B".to_string(),
                owner_id: UserId(5),
                access: AccessLevel::Private,
            },
        )
    }

    #[test]
    fn test_apply_patch_fields() {
        let mut doc = sample();
        let patch = DocumentPatch {
            content: Some("C".to_string()),
            access: Some(AccessLevel::Shared),
            ..Default::default()
        };
        doc.apply(&patch);

        assert_eq!(doc.title, "A");
        assert_eq!(doc.content, "C");
        assert_eq!(doc.access, AccessLevel::Shared);
        assert!(doc.updated_at >= doc.created_at);
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let mut doc = sample();
        let before = doc.clone();
        doc.apply(&DocumentPatch::default());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_patch_serialization_skips_unchanged_fields() {
        let patch = DocumentPatch {
            content: Some("C".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"content":"C"}"#);

        let patch = DocumentPatch {
            access: Some(AccessLevel::Shared),
            grants: Some(GrantSet::read_for([RoleId(6)])),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&patch).unwrap(),
            r#"{"access":3,"grants":{"6":3}}"#
        );
    }

    #[test]
    fn test_snapshot() {
        let snap = sample().snapshot();
        assert_eq!(snap.title, "A");
        assert_eq!(snap.access, AccessLevel::Private);
    }
}
