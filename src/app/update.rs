use tracing::debug;

use crate::app::{EditorContext, Focus, ToastLevel};
use crate::editor::{self, Clipboard, Document, Edit, Motion, Surface};
use crate::protocol::{Command, ConnectionState, Inbound, SaveRequest, normalize_identifier};

/// All possible events and actions in the application.
///
/// These represent user input, connection events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Query input
    /// Append a character to the query
    QueryInput(char),
    /// Remove the last query character
    QueryBackspace,
    /// Send the query
    SubmitQuery,
    /// Create a document titled by the query
    CreateDocument,
    /// Open the document named by the normalized query, creating it if needed
    CreateOrOpenDocument,

    // Results
    SelectNext,
    SelectPrevious,
    /// Select a result entry by index
    SelectEntry(usize),

    // Document editing
    InsertText(String),
    InsertNewline,
    DeleteBackward,
    DeleteForward,
    Paste(Clipboard),
    MoveCaret(Motion),

    // Tags
    /// Open the tag prompt
    StartTagPrompt,
    TagInput(char),
    TagBackspace,
    /// Add the typed tag to the document
    CommitTag,
    CancelTagPrompt,
    /// Remove the tag at an index
    RemoveTag(usize),
    /// Search for the tag at an index
    ActivateTag(usize),

    // Document commands
    Save,
    /// Ask for confirmation before deleting the active document
    RequestDelete,
    ConfirmDelete,
    CancelDelete,

    /// Switch focus between the query input and the document
    ToggleFocus,
    /// Terminal resized
    Resize(u16, u16),

    // Connection
    Connection(ConnectionState),
    Inbound(Inbound),

    Quit,
}

/// Apply a message to the context.
///
/// Commands for the server are queued on the context's outbox; nothing here
/// touches the connection.
pub fn update<S: Surface>(ctx: &mut EditorContext<S>, msg: Message) {
    match msg {
        Message::QueryInput(c) => ctx.query.push(c),
        Message::QueryBackspace => {
            ctx.query.pop();
        }
        Message::SubmitQuery => {
            let query = ctx.query.clone();
            send_query(ctx, query);
        }
        Message::CreateDocument => {
            let title = ctx.query.clone();
            ctx.queue(Command::Create { title });
            focus_document(ctx);
        }
        Message::CreateOrOpenDocument => {
            let file = normalize_identifier(&ctx.query);
            if file.is_empty() {
                ctx.show_toast(ToastLevel::Warning, "Type a title first");
                return;
            }
            let title = ctx.query.clone();
            ctx.queue(Command::CreateOrOpen { file, title });
            focus_document(ctx);
        }

        Message::SelectNext => {
            if ctx.results.select_next() {
                request_selected(ctx);
            }
        }
        Message::SelectPrevious => {
            if ctx.results.select_previous() {
                request_selected(ctx);
            }
        }
        Message::SelectEntry(idx) => {
            if idx < ctx.results.len() {
                let _ = ctx.results.select(idx);
                request_selected(ctx);
            }
        }

        Message::InsertText(text) => apply_edit(ctx, |s| editor::insert_text(s, &text)),
        Message::InsertNewline => apply_edit(ctx, editor::insert_newline),
        Message::DeleteBackward => apply_edit(ctx, editor::delete_backward),
        Message::DeleteForward => apply_edit(ctx, editor::delete_forward),
        Message::Paste(clipboard) => match ctx.focus {
            Focus::Query => ctx.query.push_str(&editor::single_line(&clipboard.plain_text())),
            Focus::TagPrompt => ctx
                .tag_input
                .push_str(&editor::single_line(&clipboard.plain_text())),
            Focus::Document => apply_edit(ctx, |s| editor::paste(s, &clipboard)),
        },
        Message::MoveCaret(motion) => {
            if ctx.focus == Focus::Document {
                let _ = editor::move_caret(&mut ctx.surface, motion);
            }
        }

        Message::StartTagPrompt => {
            if ctx.session.is_writable() {
                ctx.tag_input.clear();
                ctx.focus = Focus::TagPrompt;
            }
        }
        Message::TagInput(c) => {
            if ctx.focus == Focus::TagPrompt {
                ctx.tag_input.push(c);
            }
        }
        Message::TagBackspace => {
            ctx.tag_input.pop();
        }
        Message::CommitTag => {
            let tag = ctx.tag_input.trim().to_string();
            ctx.tag_input.clear();
            ctx.focus = Focus::Document;
            if !tag.is_empty() && ctx.session.mark_modified() {
                ctx.surface.document_mut().tags.push(tag);
            }
        }
        Message::CancelTagPrompt => {
            ctx.tag_input.clear();
            ctx.focus = Focus::Document;
        }
        Message::RemoveTag(idx) => {
            if idx < ctx.document().tags.len() && ctx.session.mark_modified() {
                ctx.surface.document_mut().tags.remove(idx);
            }
        }
        Message::ActivateTag(idx) => {
            if let Some(tag) = ctx.document().tags.get(idx) {
                let query = format!("#{tag}");
                ctx.query.clone_from(&query);
                send_query(ctx, query);
                ctx.focus = Focus::Query;
            }
        }

        Message::Save => save(ctx),
        Message::RequestDelete => {
            let file = ctx.active_file().map(str::to_string);
            match file {
                Some(file) if ctx.session.is_active() => ctx.pending_delete = Some(file),
                _ => ctx.show_toast(ToastLevel::Info, "No document to delete"),
            }
        }
        Message::ConfirmDelete => {
            if let Some(file) = ctx.pending_delete.take() {
                ctx.session.deactivate();
                ctx.surface.replace_document(Document::new());
                let _ = ctx.results.remove(&file);
                ctx.focus = Focus::Query;
                ctx.queue(Command::Delete(file));
            }
        }
        Message::CancelDelete => ctx.pending_delete = None,

        Message::ToggleFocus => {
            ctx.focus = match ctx.focus {
                Focus::Query if ctx.session.is_writable() => Focus::Document,
                Focus::Query => Focus::Query,
                Focus::Document | Focus::TagPrompt => Focus::Query,
            };
        }
        Message::Resize(_, height) => {
            ctx.viewport_height = height;
            let visible = ctx.visible_result_entries();
            ctx.results.ensure_visible(visible);
        }

        Message::Connection(state) => {
            if state == ConnectionState::Disconnected
                && ctx.connection == ConnectionState::Connected
            {
                ctx.show_toast(ToastLevel::Warning, "Disconnected from server");
            }
            ctx.connection = state;
        }
        Message::Inbound(inbound) => apply_inbound(ctx, inbound),

        Message::Quit => ctx.should_quit = true,
    }
}

fn send_query<S: Surface>(ctx: &mut EditorContext<S>, query: String) {
    ctx.last_query.clone_from(&query);
    ctx.queue(Command::Query(query));
}

fn focus_document<S: Surface>(ctx: &mut EditorContext<S>) {
    if ctx.session.can_edit() {
        ctx.focus = Focus::Document;
    }
}

/// Keep the selection in view and ask for its document unless already shown.
fn request_selected<S: Surface>(ctx: &mut EditorContext<S>) {
    let visible = ctx.visible_result_entries();
    ctx.results.ensure_visible(visible);
    let Some(entry) = ctx.results.selected() else {
        return;
    };
    if ctx.active_file() == Some(entry.file.as_str()) {
        return;
    }
    let command = Command::Text {
        file: entry.file.clone(),
        query: Some(entry.query_echo.clone()).filter(|q| !q.is_empty()),
    };
    ctx.queue(command);
}

fn apply_edit<S: Surface>(ctx: &mut EditorContext<S>, edit: impl FnOnce(&mut S) -> Edit) {
    if !ctx.accepts_edits() {
        debug!(focus = ?ctx.focus, state = ?ctx.session.state(), "edit refused");
        return;
    }
    if edit(&mut ctx.surface).is_applied() {
        ctx.session.mark_modified();
    }
}

fn save<S: Surface>(ctx: &mut EditorContext<S>) {
    if !ctx.session.is_modified() {
        return;
    }
    let document = ctx.document();
    let Some(file) = document.file.clone() else {
        ctx.show_toast(ToastLevel::Warning, "Document has no file yet");
        return;
    };
    let request = SaveRequest {
        file,
        title: document.title_text(),
        tags: document.tags.clone(),
        body: document.body_text(),
        create: false,
    };
    ctx.queue(Command::Save(request));
}

fn apply_inbound<S: Surface>(ctx: &mut EditorContext<S>, inbound: Inbound) {
    match inbound {
        Inbound::Results(entries) => {
            let query = ctx.last_query.clone();
            ctx.results.replace(entries, &query);
        }
        Inbound::Text(payload) => {
            let document =
                Document::from_wire(&payload.file, &payload.title, &payload.tags, &payload.body);
            ctx.surface.replace_document(document);
            ctx.session.document_loaded();
            ctx.pending_delete = None;
            if ctx.focus != Focus::Query && !ctx.session.is_writable() {
                ctx.focus = Focus::Query;
            }
        }
        Inbound::Rename { from, to } => {
            let _ = ctx.results.rename(&from, &to);
            let document = ctx.surface.document_mut();
            if document.file.as_deref() == Some(from.as_str()) {
                document.file = Some(to);
            }
        }
    }
}
