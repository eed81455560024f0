use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{EditorContext, Focus, Message};
use crate::editor::{Clipboard, Motion, Surface};

/// Translate a terminal event into a message.
pub fn message_for_event<S: Surface>(ctx: &EditorContext<S>, event: &Event) -> Option<Message> {
    // A paste answers the delete prompt like any other key.
    if ctx.pending_delete.is_some() && matches!(event, Event::Paste(_)) {
        return Some(Message::CancelDelete);
    }
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => message_for_key(ctx, *key),
        Event::Paste(text) => Some(Message::Paste(Clipboard::text(text.clone()))),
        Event::Resize(width, height) => Some(Message::Resize(*width, *height)),
        _ => None,
    }
}

pub fn message_for_key<S: Surface>(ctx: &EditorContext<S>, key: KeyEvent) -> Option<Message> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // The delete prompt swallows the next key.
    if ctx.pending_delete.is_some() {
        return Some(match key.code {
            KeyCode::Char('y' | 'Y') => Message::ConfirmDelete,
            _ => Message::CancelDelete,
        });
    }

    match key.code {
        KeyCode::Char('c' | 'q') if ctrl => return Some(Message::Quit),
        KeyCode::Char('s') if ctrl => return Some(Message::Save),
        KeyCode::Char('d') if ctrl => return Some(Message::RequestDelete),
        KeyCode::Char('n') if ctrl => return Some(Message::CreateDocument),
        KeyCode::Char('o') if ctrl => return Some(Message::CreateOrOpenDocument),
        KeyCode::Char('t') if ctrl => return Some(Message::StartTagPrompt),
        KeyCode::Tab | KeyCode::BackTab => return Some(Message::ToggleFocus),
        _ => {}
    }

    match ctx.focus {
        Focus::Query => query_key(key),
        Focus::Document => document_key(key),
        Focus::TagPrompt => tag_key(ctx, key),
    }
}

fn query_key(key: KeyEvent) -> Option<Message> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => Some(Message::Save),
        KeyCode::Enter if ctrl => Some(Message::CreateDocument),
        KeyCode::Enter => Some(Message::SubmitQuery),
        KeyCode::Up => Some(Message::SelectPrevious),
        KeyCode::Down => Some(Message::SelectNext),
        KeyCode::Backspace => Some(Message::QueryBackspace),
        KeyCode::Char(c) if !ctrl => Some(Message::QueryInput(c)),
        _ => None,
    }
}

fn document_key(key: KeyEvent) -> Option<Message> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    match key.code {
        KeyCode::Enter if shift => Some(Message::Save),
        KeyCode::Enter if ctrl => Some(Message::StartTagPrompt),
        KeyCode::Enter => Some(Message::InsertNewline),
        KeyCode::Backspace => Some(Message::DeleteBackward),
        KeyCode::Delete => Some(Message::DeleteForward),
        KeyCode::Esc => Some(Message::ToggleFocus),
        KeyCode::Left => Some(Message::MoveCaret(Motion::Left)),
        KeyCode::Right => Some(Message::MoveCaret(Motion::Right)),
        KeyCode::Up => Some(Message::MoveCaret(Motion::Up)),
        KeyCode::Down => Some(Message::MoveCaret(Motion::Down)),
        KeyCode::Home => Some(Message::MoveCaret(Motion::Home)),
        KeyCode::End => Some(Message::MoveCaret(Motion::End)),
        KeyCode::PageUp => Some(Message::MoveCaret(Motion::PageUp)),
        KeyCode::PageDown => Some(Message::MoveCaret(Motion::PageDown)),
        // Alt+1..9 searches for the n-th tag.
        KeyCode::Char(c @ '1'..='9') if alt => c
            .to_digit(10)
            .map(|n| Message::ActivateTag(n as usize - 1)),
        KeyCode::Char(c) if !ctrl && !alt => Some(Message::InsertText(c.to_string())),
        _ => None,
    }
}

fn tag_key<S: Surface>(ctx: &EditorContext<S>, key: KeyEvent) -> Option<Message> {
    match key.code {
        KeyCode::Enter => Some(Message::CommitTag),
        KeyCode::Esc => Some(Message::CancelTagPrompt),
        // Backspace on an empty prompt removes the last tag.
        KeyCode::Backspace if ctx.tag_input.is_empty() => ctx
            .document()
            .tags
            .len()
            .checked_sub(1)
            .map(Message::RemoveTag),
        KeyCode::Backspace => Some(Message::TagBackspace),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Message::TagInput(c))
        }
        _ => None,
    }
}
