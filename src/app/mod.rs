//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`EditorContext`]: The complete client state
//! - [`Message`]: All possible events and actions
//! - [`update`]: State transitions; server commands are queued, not sent
//! - [`dispatch_outbox`] / [`pump_client`]: The only code touching the connection
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod session;
mod update;

pub use effects::{dispatch_outbox, pump_client, step};
pub use input::{message_for_event, message_for_key};
pub use model::{EditorContext, Focus, ToastLevel};
pub use session::{EditorSession, SessionState};
pub use update::{Message, update};

use std::time::Duration;

use crate::protocol::ReconnectPolicy;
use crate::results::DEFAULT_MAX_SNIPPETS;

/// Main application struct that owns the terminal and runs the event loop.
pub struct App {
    server: String,
    subpath: String,
    editing: bool,
    reconnect: ReconnectPolicy,
    max_snippets: usize,
}

impl App {
    /// Create a new application talking to `server` (`host:port`).
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            subpath: String::new(),
            editing: false,
            reconnect: ReconnectPolicy::Disabled,
            max_snippets: DEFAULT_MAX_SNIPPETS,
        }
    }

    /// Path below the `/__fuzzy/` endpoint prefix.
    #[must_use]
    pub fn with_subpath(mut self, subpath: impl Into<String>) -> Self {
        self.subpath = subpath.into();
        self
    }

    /// Enable or disable editing. Without it documents are view-only.
    #[must_use]
    pub const fn with_editing(mut self, enabled: bool) -> Self {
        self.editing = enabled;
        self
    }

    #[must_use]
    pub const fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Retry with exponential backoff between `initial` and `max`.
    #[must_use]
    pub const fn with_backoff(self, initial: Duration, max: Duration) -> Self {
        self.with_reconnect(ReconnectPolicy::Backoff { initial, max })
    }

    #[must_use]
    pub const fn with_max_snippets(mut self, max_snippets: usize) -> Self {
        self.max_snippets = max_snippets;
        self
    }
}
