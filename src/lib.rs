// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. results::ResultEntry)
    clippy::module_name_repetitions
)]

//! # Fuzzynote
//!
//! A terminal client for a fuzzy-search note server.
//!
//! Fuzzynote keeps one persistent connection to the server and offers:
//! - Live ranked search with matching snippet lines per note
//! - A line-oriented editor for a note's title, tags and body
//! - Explicit save, create, create-or-open and confirmed delete
//! - An optional read-only viewer mode
//!
//! ## Architecture
//!
//! Fuzzynote uses The Elm Architecture (TEA) pattern:
//! - **Model**: [`app::EditorContext`], the whole client state
//! - **Message**: Events and actions
//! - **Update**: State transitions that queue server commands
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`editor`]: Line buffer, caret model and edit operations
//! - [`results`]: Result list and selection
//! - [`protocol`]: Wire envelopes, transports and the sync client
//! - [`ui`]: Terminal UI components
//! - [`config`]: Saved flag defaults
//! - [`wirelog`]: Optional protocol trace file

pub mod app;
pub mod config;
pub mod editor;
pub mod protocol;
pub mod results;
pub mod ui;
pub mod wirelog;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, EditorContext, Message};
    pub use crate::editor::{Document, Surface};
    pub use crate::protocol::{Command, Inbound, SyncClient};
}
