//! Minimal-diff computation for document updates.

use dms_model::{AccessLevel, DocumentEdit, DocumentPatch, DocumentSnapshot, GrantSet, RoleId};

/// Grants to persist for a document at `level`.
///
/// Only shared documents carry grants. The caller's own role is removed
/// because an owner always has access to their document.
pub fn resolve_grants(level: AccessLevel, selected: &GrantSet, caller_role: RoleId) -> GrantSet {
    if level.is_shared() {
        selected.without_role(caller_role)
    } else {
        GrantSet::new()
    }
}

/// Compute the patch that turns `previous` into `edit`.
///
/// - Title and content are included only when they changed.
/// - The access level is included when it changed, and always when it is
///   shared, since the role selection may have changed on its own.
/// - A shared result replaces the grant set with the selected roles. Leaving
///   the shared level clears the grants.
pub fn compute_patch(
    previous: &DocumentSnapshot,
    edit: &DocumentEdit,
    caller_role: RoleId,
) -> DocumentPatch {
    let mut patch = DocumentPatch::default();

    if edit.title != previous.title {
        patch.title = Some(edit.title.clone());
    }
    if edit.content != previous.content {
        patch.content = Some(edit.content.clone());
    }

    if edit.access != previous.access || edit.access.is_shared() {
        patch.access = Some(edit.access);

        if edit.access.is_shared() || previous.access.is_shared() {
            patch.grants = Some(resolve_grants(edit.access, &edit.roles, caller_role));
        }
    }

    patch
}
