//! Document mutation gateway.
//!
//! Every write follows the same order: validate the request, take the
//! document's lock, evaluate the caller's access against the stored record,
//! and only then call the store. Validation and permission failures therefore
//! never reach storage.

use access::{evaluate_record, visible_documents, EffectiveAccess, Requester};
use dms_model::{
    Document, DocumentDraft, DocumentEdit, DocumentId, DocumentRecord, DocumentSnapshot, GrantSet,
    NewDocument, RoleRegistry,
};
use doc_store::DocumentStore;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};
use crate::locks::DocumentLocks;
use crate::patch::{compute_patch, resolve_grants};

/// A document returned to a reader together with what they may do with it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedDocument {
    pub record: DocumentRecord,
    pub access: EffectiveAccess,
}

/// Validates and persists document changes
pub struct DocumentGateway<S: DocumentStore> {
    store: S,
    roles: RoleRegistry,
    locks: DocumentLocks,
}

impl<S: DocumentStore> DocumentGateway<S> {
    /// Create a gateway over a store and the known roles
    pub fn new(store: S, roles: RoleRegistry) -> Self {
        Self {
            store,
            roles,
            locks: DocumentLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    /// Create a document and its grants.
    ///
    /// The requester must be the draft's owner. Roles are only kept for
    /// shared documents, minus the owner's own role.
    pub fn create(&self, requester: &Requester, draft: DocumentDraft) -> GatewayResult<DocumentRecord> {
        if draft.owner_id != requester.user_id {
            tracing::warn!(
                "User {} tried to create a document owned by {}",
                requester.user_id,
                draft.owner_id
            );
            return Err(GatewayError::Permission(
                "Documents can only be created for yourself".to_string(),
            ));
        }
        validate_text(&draft.title, &draft.content)?;

        if !draft.access.is_shared() && !draft.roles.is_empty() {
            tracing::debug!(
                "Ignoring {} role selections on a {} document",
                draft.roles.len(),
                draft.access
            );
        }
        let grants = resolve_grants(draft.access, &draft.roles, requester.role_id);
        self.validate_roles(&grants)?;

        let new = NewDocument {
            title: draft.title,
            content: draft.content,
            owner_id: draft.owner_id,
            access: draft.access,
        };
        let id = self
            .store
            .create_document_with_grants(new.clone(), grants.clone())
            .map_err(|e| storage_failure("create", None, e))?;

        // The create is committed; a failed read-back must not turn it into
        // an error the caller would retry.
        let record = match self.store.load_document(id) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Created document {} but could not read it back: {}", id, e);
                DocumentRecord {
                    document: Document::from_new(id, new),
                    grants,
                }
            }
        };
        tracing::info!(
            "Created {} document {} for user {} with {} grants",
            record.document.access,
            id,
            requester.user_id,
            record.grants.len()
        );
        Ok(record)
    }

    /// Update a document from the editor's values.
    ///
    /// `previous` is the state the editor started from; only fields that
    /// differ from it are written. A shared result replaces the grant set
    /// as a whole.
    pub fn update(
        &self,
        requester: &Requester,
        id: DocumentId,
        previous: &DocumentSnapshot,
        edit: DocumentEdit,
    ) -> GatewayResult<DocumentRecord> {
        validate_text(&edit.title, &edit.content)?;

        if !edit.access.is_shared() && !edit.roles.is_empty() {
            tracing::debug!(
                "Ignoring {} role selections on a {} document",
                edit.roles.len(),
                edit.access
            );
        }
        let patch = compute_patch(previous, &edit, requester.role_id);
        if let Some(grants) = &patch.grants {
            self.validate_roles(grants)?;
        }

        self.locks.with_lock(id, || -> GatewayResult<DocumentRecord> {
            let current = self.store.load_document(id)?;
            self.ensure_writable(requester, &current, "update")?;

            if patch.is_empty() {
                tracing::debug!("No changes for document {}", id);
                return Ok(current);
            }

            let record = self
                .store
                .update_document(id, &patch)
                .map_err(|e| storage_failure("update", Some(id), e))?;

            tracing::info!(
                "Updated document {} (title: {}, content: {}, access: {}, grants: {})",
                id,
                patch.title.is_some(),
                patch.content.is_some(),
                patch.access.is_some(),
                patch.grants.as_ref().map(GrantSet::len).unwrap_or(0)
            );
            Ok(record)
        })
    }

    /// Replace the role grants of a shared document.
    pub fn share(
        &self,
        requester: &Requester,
        id: DocumentId,
        roles: &GrantSet,
    ) -> GatewayResult<DocumentRecord> {
        self.locks.with_lock(id, || -> GatewayResult<DocumentRecord> {
            let current = self.store.load_document(id)?;
            self.ensure_writable(requester, &current, "share")?;

            if !current.document.access.is_shared() {
                return Err(GatewayError::Validation(format!(
                    "Document {} is {}, only shared documents take role grants",
                    id, current.document.access
                )));
            }

            let grants = resolve_grants(current.document.access, roles, requester.role_id);
            self.validate_roles(&grants)?;

            self.store
                .replace_grants(id, grants.clone())
                .map_err(|e| storage_failure("share", Some(id), e))?;

            tracing::info!("Replaced grants of document {} ({} roles)", id, grants.len());
            Ok(DocumentRecord {
                document: current.document,
                grants,
            })
        })
    }

    /// Load a document the requester can read
    pub fn open(&self, requester: &Requester, id: DocumentId) -> GatewayResult<OpenedDocument> {
        let record = self.store.load_document(id)?;
        let access = evaluate_record(requester, &record);

        if !access.can_read() {
            tracing::warn!("User {} denied read access to document {}", requester.user_id, id);
            return Err(GatewayError::Permission(format!(
                "No access to document {}",
                id
            )));
        }

        Ok(OpenedDocument { record, access })
    }

    /// All documents the requester can read, in id order
    pub fn list(&self, requester: &Requester) -> GatewayResult<Vec<OpenedDocument>> {
        let records = self
            .store
            .list_documents()
            .map_err(|e| storage_failure("list", None, e))?;

        Ok(visible_documents(requester, &records)
            .into_iter()
            .map(|(record, access)| OpenedDocument {
                record: record.clone(),
                access,
            })
            .collect())
    }

    /// Delete a document and its grants. Owner only.
    pub fn delete(&self, requester: &Requester, id: DocumentId) -> GatewayResult<()> {
        self.locks.with_lock(id, || -> GatewayResult<()> {
            let current = self.store.load_document(id)?;
            self.ensure_writable(requester, &current, "delete")?;

            self.store
                .delete_document(id)
                .map_err(|e| storage_failure("delete", Some(id), e))?;
            tracing::info!("Deleted document {}", id);
            Ok(())
        })?;

        self.locks.forget(id);
        Ok(())
    }

    fn ensure_writable(
        &self,
        requester: &Requester,
        record: &DocumentRecord,
        action: &str,
    ) -> GatewayResult<()> {
        let access = evaluate_record(requester, record);
        if access.can_write() {
            return Ok(());
        }

        tracing::warn!(
            "User {} denied {} on document {} ({:?})",
            requester.user_id,
            action,
            record.document.id,
            access
        );
        Err(GatewayError::Permission(format!(
            "Only the owner can {} document {}",
            action, record.document.id
        )))
    }

    fn validate_roles(&self, grants: &GrantSet) -> GatewayResult<()> {
        let unknown: Vec<String> = grants
            .roles()
            .filter(|role| !self.roles.contains(*role))
            .map(|role| role.to_string())
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::Validation(format!(
                "Unknown roles: {}",
                unknown.join(", ")
            )))
        }
    }
}

fn validate_text(title: &str, content: &str) -> GatewayResult<()> {
    if title.trim().is_empty() {
        return Err(GatewayError::Validation("Title is required".to_string()));
    }
    if content.trim().is_empty() {
        return Err(GatewayError::Validation("Content is required".to_string()));
    }
    Ok(())
}

fn storage_failure(action: &str, id: Option<DocumentId>, err: doc_store::StorageError) -> GatewayError {
    match id {
        Some(id) => tracing::error!("Storage failure during {} of document {}: {}", action, id, err),
        None => tracing::error!("Storage failure during {}: {}", action, err),
    }
    err.into()
}
