//! Effective access for a (requester, document) pair.
//!
//! Rules are checked in order:
//!
//! 1. The owner may read and write.
//! 2. A privileged requester may read any document that is not private.
//!    Privileged status never grants write access.
//! 3. Public documents are readable by every authenticated requester.
//! 4. Shared documents are readable by requesters whose role holds a grant.
//! 5. Everything else is denied.
//!
//! Access is computed from the requester's current role each time, so a
//! user moved out of a role loses the grants attached to it immediately.

use crate::requester::Requester;
use dms_model::{AccessLevel, Document, DocumentRecord, GrantSet, UserId};
use serde::{Deserialize, Serialize};

/// Effective permission, in order of increasing access
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectiveAccess {
    /// Document is invisible to the requester
    NoAccess,
    /// Requester may view the document
    ReadOnly,
    /// Requester may view and modify the document
    ReadWrite,
}

impl EffectiveAccess {
    /// Check if this level allows viewing
    pub fn can_read(&self) -> bool {
        *self >= EffectiveAccess::ReadOnly
    }

    /// Check if this level allows editing
    pub fn can_write(&self) -> bool {
        *self == EffectiveAccess::ReadWrite
    }
}

impl Default for EffectiveAccess {
    fn default() -> Self {
        EffectiveAccess::NoAccess
    }
}

/// Compute the effective access of a requester to a document.
pub fn evaluate(
    requester: &Requester,
    owner_id: UserId,
    level: AccessLevel,
    grants: &GrantSet,
) -> EffectiveAccess {
    if requester.owns(owner_id) {
        return EffectiveAccess::ReadWrite;
    }

    match level {
        AccessLevel::Private => EffectiveAccess::NoAccess,
        _ if requester.privileged => EffectiveAccess::ReadOnly,
        AccessLevel::Public => EffectiveAccess::ReadOnly,
        AccessLevel::Shared if grants.contains_role(requester.role_id) => EffectiveAccess::ReadOnly,
        AccessLevel::Shared => EffectiveAccess::NoAccess,
    }
}

/// Evaluate against a document and its grant set
pub fn evaluate_document(
    requester: &Requester,
    document: &Document,
    grants: &GrantSet,
) -> EffectiveAccess {
    evaluate(requester, document.owner_id, document.access, grants)
}

/// Evaluate against a stored record
pub fn evaluate_record(requester: &Requester, record: &DocumentRecord) -> EffectiveAccess {
    evaluate_document(requester, &record.document, &record.grants)
}

/// Keep the records the requester can read, paired with their access
pub fn visible_documents<'a, I>(
    requester: &Requester,
    records: I,
) -> Vec<(&'a DocumentRecord, EffectiveAccess)>
where
    I: IntoIterator<Item = &'a DocumentRecord>,
{
    records
        .into_iter()
        .filter_map(|record| {
            let access = evaluate_record(requester, record);
            access.can_read().then_some((record, access))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms_model::{DocumentId, NewDocument, RoleId};
    use proptest::prelude::*;

    fn record(id: u64, owner: u64, access: AccessLevel, roles: &[u64]) -> DocumentRecord {
        DocumentRecord {
            document: Document::from_new(
                DocumentId(id),
                NewDocument {
                    title: format!("doc {}", id),
                    content: "<p>body</p>".to_string(),
                    owner_id: UserId(owner),
                    access,
                },
            ),
            grants: GrantSet::read_for(roles.iter().copied().map(RoleId)),
        }
    }

    #[test]
    fn test_access_ordering() {
        assert!(EffectiveAccess::NoAccess < EffectiveAccess::ReadOnly);
        assert!(EffectiveAccess::ReadOnly < EffectiveAccess::ReadWrite);
        assert!(!EffectiveAccess::NoAccess.can_read());
        assert!(EffectiveAccess::ReadOnly.can_read());
        assert!(!EffectiveAccess::ReadOnly.can_write());
        assert!(EffectiveAccess::ReadWrite.can_write());
    }

    #[test]
    fn test_owner_has_read_write_on_every_level() {
        let owner = Requester::new(UserId(5), RoleId(3));
        for level in AccessLevel::ALL {
            assert_eq!(
                evaluate(&owner, UserId(5), level, &GrantSet::new()),
                EffectiveAccess::ReadWrite
            );
        }
    }

    #[test]
    fn test_privileged_owner_keeps_write() {
        let owner = Requester::privileged(UserId(5), RoleId(1));
        assert_eq!(
            evaluate(&owner, UserId(5), AccessLevel::Private, &GrantSet::new()),
            EffectiveAccess::ReadWrite
        );
    }

    #[test]
    fn test_public_document_is_read_only_for_others() {
        let user = Requester::new(UserId(2), RoleId(7));
        assert_eq!(
            evaluate(&user, UserId(1), AccessLevel::Public, &GrantSet::new()),
            EffectiveAccess::ReadOnly
        );
    }

    #[test]
    fn test_shared_document_follows_grants() {
        let grants = GrantSet::read_for([RoleId(4)]);
        let granted = Requester::new(UserId(2), RoleId(4));
        let other = Requester::new(UserId(3), RoleId(9));

        assert_eq!(
            evaluate(&granted, UserId(1), AccessLevel::Shared, &grants),
            EffectiveAccess::ReadOnly
        );
        assert_eq!(
            evaluate(&other, UserId(1), AccessLevel::Shared, &grants),
            EffectiveAccess::NoAccess
        );
    }

    #[test]
    fn test_private_document_denies_non_owners() {
        let user = Requester::new(UserId(2), RoleId(4));
        let overlord = Requester::privileged(UserId(3), RoleId(1));

        assert_eq!(
            evaluate(&user, UserId(1), AccessLevel::Private, &GrantSet::new()),
            EffectiveAccess::NoAccess
        );
        assert_eq!(
            evaluate(&overlord, UserId(1), AccessLevel::Private, &GrantSet::new()),
            EffectiveAccess::NoAccess
        );
    }

    #[test]
    fn test_privileged_reads_shared_without_grant() {
        let overlord = Requester::privileged(UserId(3), RoleId(1));
        assert_eq!(
            evaluate(&overlord, UserId(1), AccessLevel::Shared, &GrantSet::new()),
            EffectiveAccess::ReadOnly
        );
    }

    #[test]
    fn test_privileged_role_grant_does_not_give_write() {
        let overlord = Requester::privileged(UserId(3), RoleId(1));
        let grants = GrantSet::read_for([RoleId(1)]);
        assert_eq!(
            evaluate(&overlord, UserId(1), AccessLevel::Shared, &grants),
            EffectiveAccess::ReadOnly
        );
    }

    #[test]
    fn test_grants_ignored_on_private_document() {
        // Stale grants left on a private document never open it up
        let user = Requester::new(UserId(2), RoleId(4));
        let grants = GrantSet::read_for([RoleId(4)]);
        assert_eq!(
            evaluate(&user, UserId(1), AccessLevel::Private, &grants),
            EffectiveAccess::NoAccess
        );
    }

    #[test]
    fn test_role_change_is_seen_at_read_time() {
        let grants = GrantSet::read_for([RoleId(4)]);
        let before = Requester::new(UserId(2), RoleId(4));
        let after = Requester::new(UserId(2), RoleId(5));

        assert!(evaluate(&before, UserId(1), AccessLevel::Shared, &grants).can_read());
        assert!(!evaluate(&after, UserId(1), AccessLevel::Shared, &grants).can_read());
    }

    #[test]
    fn test_visible_documents() {
        let records = vec![
            record(1, 1, AccessLevel::Private, &[]),
            record(2, 1, AccessLevel::Public, &[]),
            record(3, 1, AccessLevel::Shared, &[4]),
            record(4, 1, AccessLevel::Shared, &[6]),
            record(5, 2, AccessLevel::Private, &[]),
        ];
        let requester = Requester::new(UserId(2), RoleId(4));

        let visible = visible_documents(&requester, &records);
        let ids: Vec<_> = visible.iter().map(|(r, a)| (r.document.id.0, *a)).collect();

        assert_eq!(
            ids,
            vec![
                (2, EffectiveAccess::ReadOnly),
                (3, EffectiveAccess::ReadOnly),
                (5, EffectiveAccess::ReadWrite),
            ]
        );
    }

    fn level_strategy() -> impl Strategy<Value = AccessLevel> {
        prop_oneof![
            Just(AccessLevel::Private),
            Just(AccessLevel::Public),
            Just(AccessLevel::Shared),
        ]
    }

    proptest! {
        #[test]
        fn prop_evaluate_is_deterministic(
            user in 0u64..8,
            role in 0u64..8,
            privileged in any::<bool>(),
            owner in 0u64..8,
            level in level_strategy(),
            roles in proptest::collection::vec(0u64..8, 0..5),
        ) {
            let requester = Requester { user_id: UserId(user), role_id: RoleId(role), privileged };
            let grants = GrantSet::read_for(roles.into_iter().map(RoleId));
            let snapshot = grants.clone();

            let first = evaluate(&requester, UserId(owner), level, &grants);
            let second = evaluate(&requester, UserId(owner), level, &grants);

            prop_assert_eq!(first, second);
            prop_assert_eq!(grants, snapshot);
        }

        #[test]
        fn prop_only_owner_can_write(
            user in 0u64..8,
            role in 0u64..8,
            privileged in any::<bool>(),
            owner in 0u64..8,
            level in level_strategy(),
            roles in proptest::collection::vec(0u64..8, 0..5),
        ) {
            let requester = Requester { user_id: UserId(user), role_id: RoleId(role), privileged };
            let grants = GrantSet::read_for(roles.into_iter().map(RoleId));
            let access = evaluate(&requester, UserId(owner), level, &grants);

            prop_assert_eq!(access.can_write(), user == owner);
        }

        #[test]
        fn prop_private_is_owner_only(
            user in 0u64..8,
            role in 0u64..8,
            privileged in any::<bool>(),
            owner in 0u64..8,
        ) {
            let requester = Requester { user_id: UserId(user), role_id: RoleId(role), privileged };
            let access = evaluate(&requester, UserId(owner), AccessLevel::Private, &GrantSet::new());
            prop_assert_eq!(access.can_read(), user == owner);
        }
    }
}
