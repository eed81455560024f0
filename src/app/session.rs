use tracing::debug;

/// Observable state of an [`EditorSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The surface is read-only: nothing loaded, deactivated, or a viewer session.
    Inactive,
    Clean,
    Modified,
}

/// Activation and dirty tracking for the document surface.
///
/// `editing` is fixed at startup. Without it the session never leaves
/// [`SessionState::Inactive`], even while documents are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSession {
    editing: bool,
    active: bool,
    modified: bool,
}

impl EditorSession {
    pub const fn new(editing: bool) -> Self {
        Self {
            editing,
            active: false,
            modified: false,
        }
    }

    pub const fn state(&self) -> SessionState {
        match (self.active, self.modified) {
            (false, _) => SessionState::Inactive,
            (true, false) => SessionState::Clean,
            (true, true) => SessionState::Modified,
        }
    }

    pub const fn can_edit(&self) -> bool {
        self.editing
    }

    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// Whether edits may be applied to the surface right now.
    pub const fn is_writable(&self) -> bool {
        self.editing && self.active
    }

    /// Make the surface writable. No effect without the editing capability.
    pub fn activate(&mut self) {
        if self.editing {
            self.active = true;
        }
    }

    /// Make the surface read-only and forget pending changes.
    ///
    /// The caller is responsible for clearing the document content.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.modified = false;
    }

    /// Record a local edit. Returns `true` if the session was writable.
    pub fn mark_modified(&mut self) -> bool {
        if !self.is_writable() {
            debug!("edit refused: session not writable");
            return false;
        }
        self.modified = true;
        true
    }

    /// A save was handed to the connection; changes count as persisted.
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// A fresh document replaced the surface content. Unsaved changes are dropped.
    pub fn document_loaded(&mut self) {
        if self.modified {
            debug!("discarding unsaved changes for newly loaded document");
        }
        self.modified = false;
        self.active = self.editing;
    }
}
