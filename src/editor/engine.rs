//! Character-level editing on top of a [`Surface`].
//!
//! Every operation reads the caret through the cursor model, strips any
//! highlight overlay from the caret's line, mutates the focused region's
//! [`LineBuffer`](super::LineBuffer) and places the caret again. Operations at
//! a region boundary with nothing to join return [`Edit::Unchanged`] and leave
//! both content and caret untouched.

use std::sync::LazyLock;

use regex::Regex;

use super::cursor::{self, Cursor, Field};
use super::document::single_line;
use super::line::Line;
use super::surface::Surface;

/// Line separator of the document text.
pub const SEPARATOR: char = '\n';

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"));

/// Outcome of an edit operation.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Applied,
    Unchanged,
}

impl Edit {
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Clipboard content offered to a paste.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clipboard {
    pub text: Option<String>,
    pub html: Option<String>,
}

impl Clipboard {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            html: None,
        }
    }

    pub fn html(html: impl Into<String>) -> Self {
        Self {
            text: None,
            html: Some(html.into()),
        }
    }

    /// The plain-text projection. Markup is dropped, never turned into breaks.
    pub fn plain_text(&self) -> String {
        if let Some(text) = &self.text {
            return text.clone();
        }
        self.html.as_deref().map(strip_markup).unwrap_or_default()
    }
}

fn strip_markup(html: &str) -> String {
    MARKUP_TAG
        .replace_all(html, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Strip the overlay from the caret's line, keeping the logical caret.
fn strip_overlay<S: Surface + ?Sized>(surface: &mut S) -> (Field, Cursor) {
    let field = cursor::focus(surface);
    let pos = cursor::position(surface);
    if surface
        .document_mut()
        .region_mut(field)
        .normalize_line(pos.line)
    {
        cursor::set_position(surface, field, pos);
    }
    (field, pos)
}

/// Insert plain text at the caret.
///
/// Text without separators widens the current line. Text with separators
/// splits into segments: the first joins the current line at the caret, each
/// further segment becomes a new line, and the original tail moves to the end
/// of the last new line. The caret ends right after the inserted text.
/// In the title, separators become spaces.
pub fn insert_text<S: Surface + ?Sized>(surface: &mut S, text: &str) -> Edit {
    let text = normalize_line_endings(text);
    if text.is_empty() {
        return Edit::Unchanged;
    }
    if text.len() == 1 && text.starts_with(SEPARATOR) {
        return insert_newline(surface);
    }
    let (field, pos) = strip_overlay(surface);
    let text = match field {
        Field::Title => single_line(&text),
        Field::Body => text,
    };

    let buffer = surface.document_mut().region_mut(field);
    let mut segments = text.split(SEPARATOR);
    let first = segments.next().unwrap_or_default();
    let rest: Vec<&str> = segments.collect();

    let target = if let Some(last) = rest.last() {
        let Some(line) = buffer.line(pos.line) else {
            return Edit::Unchanged;
        };
        let tail: String = line.text().chars().skip(pos.offset).collect();
        let line_len = line.len();
        buffer.replace_range(pos.line, pos.offset, line_len, first);
        let mut at = pos.line;
        for segment in &rest {
            at += 1;
            buffer.insert_line(at, Line::plain(*segment));
        }
        buffer.append(at, &tail);
        Cursor::at(at, last.chars().count())
    } else {
        let Some(end) = buffer.replace_range(pos.line, pos.offset, pos.offset, first) else {
            return Edit::Unchanged;
        };
        Cursor::at(pos.line, end)
    };

    cursor::set_position(surface, field, target);
    Edit::Applied
}

/// Insert a line break at the caret.
///
/// Boundary policy, in order: at offset 0 a blank line goes before the current
/// line and the caret stays on the original line; at the line end a blank line
/// goes after and the caret moves onto it; otherwise the line is split and the
/// caret moves to the start of the tail. The title never takes a break.
pub fn insert_newline<S: Surface + ?Sized>(surface: &mut S) -> Edit {
    if cursor::focus(surface) == Field::Title {
        return Edit::Unchanged;
    }
    let (_, pos) = strip_overlay(surface);
    let body = &mut surface.document_mut().body;
    let len = body.line_len(pos.line);

    if pos.offset == 0 {
        body.insert_line(pos.line, Line::blank());
    } else if pos.offset == len {
        body.insert_line(pos.line + 1, Line::blank());
    } else if body.split_at(pos.line, pos.offset).is_none() {
        return Edit::Unchanged;
    }

    cursor::set_position(surface, Field::Body, Cursor::at(pos.line + 1, 0));
    Edit::Applied
}

/// Backspace.
pub fn delete_backward<S: Surface + ?Sized>(surface: &mut S) -> Edit {
    let (field, pos) = strip_overlay(surface);
    let buffer = surface.document_mut().region_mut(field);

    let target = if buffer.line(pos.line).is_some_and(Line::is_empty) {
        if pos.line == 0 {
            return Edit::Unchanged;
        }
        buffer.remove_line(pos.line);
        Cursor::at(pos.line - 1, buffer.line_len(pos.line - 1))
    } else if pos.offset == 0 {
        let Some(seam) = buffer.merge_with_prev(pos.line) else {
            return Edit::Unchanged;
        };
        Cursor::at(pos.line - 1, seam)
    } else if buffer.line_len(pos.line) == 1 {
        buffer.set_line_text(pos.line, "");
        Cursor::at(pos.line, 0)
    } else {
        buffer.replace_range(pos.line, pos.offset - 1, pos.offset, "");
        Cursor::at(pos.line, pos.offset - 1)
    };

    cursor::set_position(surface, field, target);
    Edit::Applied
}

/// Delete key.
pub fn delete_forward<S: Surface + ?Sized>(surface: &mut S) -> Edit {
    let (field, pos) = strip_overlay(surface);
    let buffer = surface.document_mut().region_mut(field);
    let len = buffer.line_len(pos.line);

    let target = if buffer.line(pos.line).is_some_and(Line::is_empty) {
        if pos.line + 1 >= buffer.line_count() {
            return Edit::Unchanged;
        }
        buffer.remove_line(pos.line);
        Cursor::at(pos.line, 0)
    } else if pos.offset == len {
        let Some(seam) = buffer.merge_with_next(pos.line) else {
            return Edit::Unchanged;
        };
        Cursor::at(pos.line, seam)
    } else if len == 1 {
        buffer.set_line_text(pos.line, "");
        Cursor::at(pos.line, 0)
    } else {
        buffer.replace_range(pos.line, pos.offset, pos.offset + 1, "");
        Cursor::at(pos.line, pos.offset)
    };

    cursor::set_position(surface, field, target);
    Edit::Applied
}

/// Paste the plain-text projection of the clipboard at the caret.
pub fn paste<S: Surface + ?Sized>(surface: &mut S, clipboard: &Clipboard) -> Edit {
    insert_text(surface, &clipboard.plain_text())
}
