//! Per-document editing state machine.
//!
//! An `EditorSession` models one document open in an editor. It is a plain
//! value: every transition consumes the session and returns the next one,
//! and `submission` turns the current values into a gateway request.
//!
//! ```text
//!            begin_edit (ReadWrite only)
//!   Read ──────────────────────────────▶ Write
//!    ▲  ◀──────────────────────────────  │
//!    │        cancel / saved             │
//!    │ saved                             │
//!   New ──── cancel ──▶ (discarded)      │
//! ```
//!
//! Rich-text editing itself lives behind the `EditorController` trait, owned
//! by the presentation layer.

use access::{EffectiveAccess, Requester};
use dms_model::{
    AccessLevel, DocumentDraft, DocumentEdit, DocumentId, DocumentRecord, DocumentSnapshot,
    GrantSet, RoleId, UserId,
};
use std::collections::BTreeSet;

use crate::error::EditorError;

/// Editing mode of a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorMode {
    /// Composing a document that does not exist yet
    New,
    /// Viewing a stored document
    Read,
    /// Editing a stored document
    Write,
}

impl EditorMode {
    pub fn name(&self) -> &'static str {
        match self {
            EditorMode::New => "new",
            EditorMode::Read => "read",
            EditorMode::Write => "write",
        }
    }

    /// Whether the form fields are editable in this mode
    pub fn is_editing(&self) -> bool {
        matches!(self, EditorMode::New | EditorMode::Write)
    }
}

/// A request ready for the gateway
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    Create(DocumentDraft),
    Update {
        id: DocumentId,
        previous: DocumentSnapshot,
        edit: DocumentEdit,
    },
}

/// State of one document in the editor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorSession {
    user: Requester,
    mode: EditorMode,
    document_id: Option<DocumentId>,
    owner_id: Option<UserId>,
    /// Stored values the session was opened with
    previous: Option<DocumentSnapshot>,
    previous_roles: BTreeSet<RoleId>,
    access: EffectiveAccess,
    title: String,
    content: String,
    level: AccessLevel,
    selected_roles: BTreeSet<RoleId>,
}

impl EditorSession {
    /// Start composing a new document
    pub fn new_document(user: Requester) -> Self {
        Self {
            user,
            mode: EditorMode::New,
            document_id: None,
            owner_id: Some(user.user_id),
            previous: None,
            previous_roles: BTreeSet::new(),
            access: EffectiveAccess::ReadWrite,
            title: String::new(),
            content: String::new(),
            level: AccessLevel::default(),
            selected_roles: BTreeSet::new(),
        }
    }

    /// Open a stored document for viewing
    pub fn open(user: Requester, record: &DocumentRecord, access: EffectiveAccess) -> Self {
        let roles: BTreeSet<RoleId> = record.grants.roles().collect();
        Self {
            user,
            mode: EditorMode::Read,
            document_id: Some(record.document.id),
            owner_id: Some(record.document.owner_id),
            previous: Some(record.document.snapshot()),
            previous_roles: roles.clone(),
            access,
            title: record.document.title.clone(),
            content: record.document.content.clone(),
            level: record.document.access,
            selected_roles: roles,
        }
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn document_id(&self) -> Option<DocumentId> {
        self.document_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn level(&self) -> AccessLevel {
        self.level
    }

    pub fn selected_roles(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.selected_roles.iter().copied()
    }

    /// Whether the edit action is offered
    pub fn can_edit(&self) -> bool {
        self.mode == EditorMode::Read && self.access.can_write()
    }

    /// Whether the access-level and role controls are offered.
    ///
    /// Hidden for the privileged role and for anyone but the owner.
    pub fn access_controls_enabled(&self) -> bool {
        !self.user.privileged && self.owner_id == Some(self.user.user_id)
    }

    /// Switch from reading to writing
    pub fn begin_edit(self) -> Result<Self, EditorError> {
        self.require_mode(EditorMode::Read, "begin editing")?;
        if !self.access.can_write() {
            return Err(EditorError::ReadOnly);
        }
        Ok(Self {
            mode: EditorMode::Write,
            ..self
        })
    }

    pub fn with_title(self, title: impl Into<String>) -> Result<Self, EditorError> {
        self.require_editing("change the title")?;
        Ok(Self {
            title: title.into(),
            ..self
        })
    }

    pub fn with_content(self, content: impl Into<String>) -> Result<Self, EditorError> {
        self.require_editing("change the content")?;
        Ok(Self {
            content: content.into(),
            ..self
        })
    }

    /// Pull the current content out of an editor controller
    pub fn sync_content(self, editor: &dyn EditorController) -> Result<Self, EditorError> {
        let content = editor.content();
        self.with_content(content)
    }

    /// Push this session's content into an editor controller
    pub fn load_into(&self, editor: &mut dyn EditorController) {
        editor.set_content(&self.content);
    }

    /// Choose the access level.
    ///
    /// Picking a non-shared level resets the role selection to the user's
    /// own role.
    pub fn with_level(self, level: AccessLevel) -> Result<Self, EditorError> {
        self.require_editing("change the access level")?;
        self.require_access_controls()?;

        let selected_roles = if level.is_shared() {
            self.selected_roles.clone()
        } else {
            BTreeSet::from([self.user.role_id])
        };
        Ok(Self {
            level,
            selected_roles,
            ..self
        })
    }

    /// Replace the role selection
    pub fn with_roles<I>(self, roles: I) -> Result<Self, EditorError>
    where
        I: IntoIterator<Item = RoleId>,
    {
        self.require_editing("select roles")?;
        self.require_access_controls()?;
        Ok(Self {
            selected_roles: roles.into_iter().collect(),
            ..self
        })
    }

    /// Build the gateway request for the current values
    pub fn submission(&self) -> Result<Submission, EditorError> {
        let roles = GrantSet::read_for(self.selected_roles.iter().copied());

        match (self.mode, self.document_id, &self.previous) {
            (EditorMode::New, _, _) => Ok(Submission::Create(DocumentDraft {
                title: self.title.clone(),
                content: self.content.clone(),
                owner_id: self.user.user_id,
                access: self.level,
                roles: roles.without_role(self.user.role_id),
            })),
            (EditorMode::Write, Some(id), Some(previous)) => Ok(Submission::Update {
                id,
                previous: previous.clone(),
                edit: DocumentEdit {
                    title: self.title.clone(),
                    content: self.content.clone(),
                    access: self.level,
                    roles,
                },
            }),
            (mode, _, _) => Err(EditorError::InvalidTransition {
                action: "save",
                mode: mode.name(),
            }),
        }
    }

    /// Record a successful save and return to reading
    pub fn saved(self, record: &DocumentRecord) -> Result<Self, EditorError> {
        self.require_editing("save")?;
        let access = if self.user.user_id == record.document.owner_id {
            EffectiveAccess::ReadWrite
        } else {
            self.access
        };
        Ok(Self::open(self.user, record, access))
    }

    /// Leave the current mode.
    ///
    /// Returns `None` when the session closes: a new draft is discarded and
    /// a read-mode session is closed. Cancelling a write restores the stored
    /// values.
    pub fn cancel(self) -> Option<Self> {
        match self.mode {
            EditorMode::New | EditorMode::Read => None,
            EditorMode::Write => {
                let previous = self.previous.clone()?;
                Some(Self {
                    mode: EditorMode::Read,
                    title: previous.title,
                    content: previous.content,
                    level: previous.access,
                    selected_roles: self.previous_roles.clone(),
                    ..self
                })
            }
        }
    }

    fn require_mode(&self, mode: EditorMode, action: &'static str) -> Result<(), EditorError> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(EditorError::InvalidTransition {
                action,
                mode: self.mode.name(),
            })
        }
    }

    fn require_editing(&self, action: &'static str) -> Result<(), EditorError> {
        if self.mode.is_editing() {
            Ok(())
        } else {
            Err(EditorError::InvalidTransition {
                action,
                mode: self.mode.name(),
            })
        }
    }

    fn require_access_controls(&self) -> Result<(), EditorError> {
        if self.access_controls_enabled() {
            Ok(())
        } else {
            Err(EditorError::AccessControlsLocked)
        }
    }
}

/// Rich-text editor surface owned by the presentation layer
pub trait EditorController {
    /// Current content
    fn content(&self) -> String;

    /// Replace the content without notifying change listeners
    fn set_content(&mut self, content: &str);

    /// Register a listener called with the new content on every user change
    fn on_change(&mut self, callback: Box<dyn FnMut(&str) + Send>);
}

/// Plain in-memory editor
#[derive(Default)]
pub struct BufferEditor {
    content: String,
    listeners: Vec<Box<dyn FnMut(&str) + Send>>,
}

impl BufferEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a user change and notify listeners
    pub fn edit(&mut self, content: impl Into<String>) {
        self.content = content.into();
        for listener in &mut self.listeners {
            listener(&self.content);
        }
    }
}

impl EditorController for BufferEditor {
    fn content(&self) -> String {
        self.content.clone()
    }

    fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
    }

    fn on_change(&mut self, callback: Box<dyn FnMut(&str) + Send>) {
        self.listeners.push(callback);
    }
}

impl std::fmt::Debug for BufferEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferEditor")
            .field("content", &self.content)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
