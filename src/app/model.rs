use std::time::{Duration, Instant};

use crate::editor::{Document, HeadlessSurface, Surface};
use crate::protocol::{Command, ConnectionState};
use crate::results::{DEFAULT_MAX_SNIPPETS, ResultList};

use super::session::EditorSession;

const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Rows around the result list: query bar, toast line, status line and the
/// pane border.
const CHROME_ROWS: u16 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Which input receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Query,
    Document,
    /// Typing a new tag label.
    TagPrompt,
}

/// The complete client state.
///
/// Everything the editor knows lives here and is passed by reference to every
/// operation; there is no global state.
pub struct EditorContext<S: Surface> {
    /// Document plus caret
    pub surface: S,
    /// Activation and dirty tracking
    pub session: EditorSession,
    /// Last received result list
    pub results: ResultList,
    /// Query input text
    pub query: String,
    /// Query most recently sent; stands in for a missing query echo
    pub last_query: String,
    pub focus: Focus,
    /// Label being typed in the tag prompt
    pub tag_input: String,
    /// File awaiting delete confirmation
    pub pending_delete: Option<String>,
    /// Connection state as last reported by the client
    pub connection: ConnectionState,
    /// Snippet lines shown per result entry
    pub max_snippets: usize,
    /// Terminal height, used to size the result pane
    pub viewport_height: u16,
    /// Whether the app should quit
    pub should_quit: bool,
    outbox: Vec<Command>,
    toast: Option<Toast>,
}

impl<S: Surface> std::fmt::Debug for EditorContext<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorContext")
            .field("file", &self.surface.document().file)
            .field("session", &self.session)
            .field("focus", &self.focus)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

impl<S: Surface> EditorContext<S> {
    pub fn new(surface: S, editing: bool) -> Self {
        Self {
            surface,
            session: EditorSession::new(editing),
            results: ResultList::new(),
            query: String::new(),
            last_query: String::new(),
            focus: Focus::Query,
            tag_input: String::new(),
            pending_delete: None,
            connection: ConnectionState::Disconnected,
            max_snippets: DEFAULT_MAX_SNIPPETS,
            viewport_height: 24,
            should_quit: false,
            outbox: Vec::new(),
            toast: None,
        }
    }

    #[must_use]
    pub fn with_max_snippets(mut self, max_snippets: usize) -> Self {
        self.max_snippets = max_snippets;
        self
    }

    pub fn document(&self) -> &Document {
        self.surface.document()
    }

    /// Identifier of the document on the surface, if the server assigned one.
    pub fn active_file(&self) -> Option<&str> {
        self.surface.document().file.as_deref()
    }

    /// Whether editing keys reach the document right now.
    pub fn accepts_edits(&self) -> bool {
        self.session.is_writable() && self.focus == Focus::Document
    }

    /// How many result entries fit in the result pane.
    pub fn visible_result_entries(&self) -> usize {
        let rows = usize::from(self.viewport_height.saturating_sub(CHROME_ROWS));
        (rows / (1 + self.max_snippets)).max(1)
    }

    pub(super) fn queue(&mut self, command: Command) {
        self.outbox.push(command);
    }

    /// Commands produced by updates and not yet handed to the connection.
    pub fn outbox(&self) -> &[Command] {
        &self.outbox
    }

    pub fn take_outbox(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    pub fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}

impl Default for EditorContext<HeadlessSurface> {
    fn default() -> Self {
        Self::new(HeadlessSurface::default(), true)
    }
}
