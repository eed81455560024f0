use super::buffer::LineBuffer;
use super::surface::Surface;

/// Editable region of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Body,
}

/// An edit position inside one region.
///
/// `offset == line length` means "at the end of this line", which is a
/// different position from offset 0 of the next line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based character offset within the line's plain text.
    pub offset: usize,
}

impl Cursor {
    pub const fn at(line: usize, offset: usize) -> Self {
        Self { line, offset }
    }

    /// Clamp to an existing line and to that line's length.
    pub fn clamped(self, buffer: &LineBuffer) -> Self {
        let line = self.line.min(buffer.line_count().saturating_sub(1));
        Self {
            line,
            offset: self.offset.min(buffer.line_len(line)),
        }
    }

    /// Absolute offset into the region text joined with single separators.
    pub fn to_absolute(self, buffer: &LineBuffer) -> usize {
        let cursor = self.clamped(buffer);
        let before: usize = buffer.lines()[..cursor.line]
            .iter()
            .map(|line| line.len() + 1)
            .sum();
        before + cursor.offset
    }

    /// Inverse of [`to_absolute`](Self::to_absolute); clamps past the end.
    ///
    /// An absolute offset that falls on a separator resolves to the end of the
    /// line before it.
    pub fn from_absolute(buffer: &LineBuffer, absolute: usize) -> Self {
        let mut remaining = absolute;
        let last = buffer.line_count().saturating_sub(1);
        for (idx, line) in buffer.lines().iter().enumerate() {
            let len = line.len();
            if remaining <= len || idx == last {
                return Self::at(idx, remaining.min(len));
            }
            remaining -= len + 1;
        }
        Self::default()
    }
}

/// A cursor tagged with the region it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub field: Field,
    pub cursor: Cursor,
}

impl Caret {
    pub const fn new(field: Field, cursor: Cursor) -> Self {
        Self { field, cursor }
    }

    pub const fn body_start() -> Self {
        Self::new(Field::Body, Cursor::at(0, 0))
    }

    pub const fn title_start() -> Self {
        Self::new(Field::Title, Cursor::at(0, 0))
    }
}

impl Default for Caret {
    fn default() -> Self {
        Self::body_start()
    }
}

/// What a start/end predicate is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The caret's own line.
    Line,
    /// The whole region (title or body).
    Region,
}

/// Caret movements, including hops between title and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
}

/// Region currently holding the caret.
pub fn focus<S: Surface + ?Sized>(surface: &S) -> Field {
    surface.caret().field
}

/// Read the caret and resolve it against the current content.
///
/// The surface may hold a stale caret (content changed underneath it); the
/// result is always a valid address in the focused region.
pub fn position<S: Surface + ?Sized>(surface: &S) -> Cursor {
    let caret = surface.caret();
    caret.cursor.clamped(surface.document().region(caret.field))
}

/// Caret position as an absolute offset into its region.
pub fn absolute_position<S: Surface + ?Sized>(surface: &S) -> usize {
    let caret = surface.caret();
    caret
        .cursor
        .to_absolute(surface.document().region(caret.field))
}

/// Move the caret into `field` at `pos` (clamped).
///
/// Idempotent: [`position`] immediately afterwards returns the clamped `pos`.
pub fn set_position<S: Surface + ?Sized>(surface: &mut S, field: Field, pos: Cursor) {
    let pos = pos.clamped(surface.document().region(field));
    surface.place_caret(Caret::new(field, pos));
}

/// Move the caret to an absolute offset within `field`.
pub fn set_absolute_position<S: Surface + ?Sized>(surface: &mut S, field: Field, absolute: usize) {
    let pos = Cursor::from_absolute(surface.document().region(field), absolute);
    surface.place_caret(Caret::new(field, pos));
}

pub fn at_start<S: Surface + ?Sized>(surface: &S, scope: Scope) -> bool {
    match scope {
        Scope::Line => position(surface).offset == 0,
        Scope::Region => absolute_position(surface) == 0,
    }
}

pub fn at_end<S: Surface + ?Sized>(surface: &S, scope: Scope) -> bool {
    let field = focus(surface);
    let region = surface.document().region(field);
    let pos = position(surface);
    match scope {
        Scope::Line => pos.offset == region.line_len(pos.line),
        Scope::Region => pos.to_absolute(region) == region.total_len(),
    }
}

/// Apply a caret motion. Returns `true` if the caret moved.
///
/// The title hands off to the body on Right-at-end, Down and `PageDown`; the
/// body hands back to the title on Left at its start (title end) and on Up or
/// `PageUp` at its start (title start).
pub fn move_caret<S: Surface + ?Sized>(surface: &mut S, motion: Motion) -> bool {
    let field = focus(surface);
    let before = Caret::new(field, position(surface));
    let target = match field {
        Field::Title => title_motion(surface, motion),
        Field::Body => body_motion(surface, motion),
    };
    let Some(target) = target else {
        return false;
    };
    set_position(surface, target.field, target.cursor);
    surface.caret() != before
}

fn title_motion<S: Surface + ?Sized>(surface: &S, motion: Motion) -> Option<Caret> {
    let pos = position(surface);
    let len = surface.document().title.line_len(0);
    match motion {
        Motion::Right if pos.offset >= len => Some(Caret::body_start()),
        Motion::Down | Motion::PageDown => Some(Caret::body_start()),
        Motion::Right => Some(Caret::new(Field::Title, Cursor::at(0, pos.offset + 1))),
        Motion::Left => Some(Caret::new(
            Field::Title,
            Cursor::at(0, pos.offset.saturating_sub(1)),
        )),
        Motion::Home => Some(Caret::title_start()),
        Motion::End => Some(Caret::new(Field::Title, Cursor::at(0, len))),
        Motion::Up | Motion::PageUp => None,
    }
}

fn body_motion<S: Surface + ?Sized>(surface: &S, motion: Motion) -> Option<Caret> {
    let body = &surface.document().body;
    let pos = position(surface);
    let at_body_start = pos.line == 0 && pos.offset == 0;
    let body_at =
        |line: usize, offset: usize| Some(Caret::new(Field::Body, Cursor::at(line, offset)));
    match motion {
        Motion::Left if at_body_start => {
            let title_len = surface.document().title.line_len(0);
            Some(Caret::new(Field::Title, Cursor::at(0, title_len)))
        }
        Motion::Up | Motion::PageUp if at_body_start => Some(Caret::title_start()),
        Motion::Left if pos.offset == 0 => body_at(pos.line - 1, body.line_len(pos.line - 1)),
        Motion::Left => body_at(pos.line, pos.offset - 1),
        Motion::Right if pos.offset >= body.line_len(pos.line) => {
            if pos.line + 1 < body.line_count() {
                body_at(pos.line + 1, 0)
            } else {
                None
            }
        }
        Motion::Right => body_at(pos.line, pos.offset + 1),
        Motion::Up if pos.line == 0 => body_at(0, 0),
        Motion::Up => body_at(pos.line - 1, pos.offset),
        Motion::Down if pos.line + 1 >= body.line_count() => {
            body_at(pos.line, body.line_len(pos.line))
        }
        Motion::Down => body_at(pos.line + 1, pos.offset),
        Motion::Home => body_at(pos.line, 0),
        Motion::End => body_at(pos.line, body.line_len(pos.line)),
        Motion::PageUp => body_at(pos.line.saturating_sub(PAGE_LINES), pos.offset),
        Motion::PageDown => body_at(pos.line + PAGE_LINES, pos.offset),
    }
}

const PAGE_LINES: usize = 20;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Document, HeadlessSurface};

    fn surface(title: &str, body: &str) -> HeadlessSurface {
        HeadlessSurface::new(Document::from_wire("f", title, &[], body))
    }

    // --- Absolute offsets ---

    #[test]
    fn test_to_absolute_counts_separators() {
        let buf = LineBuffer::from_text("ab\ncde\nf");
        assert_eq!(Cursor::at(0, 0).to_absolute(&buf), 0);
        assert_eq!(Cursor::at(1, 0).to_absolute(&buf), 3);
        assert_eq!(Cursor::at(2, 1).to_absolute(&buf), 8);
    }

    #[test]
    fn test_from_absolute_prefers_end_of_line() {
        let buf = LineBuffer::from_text("ab\ncd");
        assert_eq!(Cursor::from_absolute(&buf, 2), Cursor::at(0, 2));
        assert_eq!(Cursor::from_absolute(&buf, 3), Cursor::at(1, 0));
        assert_eq!(Cursor::from_absolute(&buf, 99), Cursor::at(1, 2));
    }

    #[test]
    fn test_sentinel_line_has_zero_width_in_offsets() {
        let buf = LineBuffer::from_text("a\n\nb");
        assert_eq!(Cursor::at(2, 0).to_absolute(&buf), 3);
        assert_eq!(Cursor::at(1, 5).clamped(&buf), Cursor::at(1, 0));
    }

    // --- Position reads and writes ---

    #[test]
    fn test_set_position_is_idempotent() {
        let mut s = surface("Title", "hello\nworld");
        set_position(&mut s, Field::Body, Cursor::at(1, 3));
        assert_eq!(position(&s), Cursor::at(1, 3));
        let pos = position(&s);
        set_position(&mut s, Field::Body, pos);
        assert_eq!(position(&s), Cursor::at(1, 3));
    }

    #[test]
    fn test_set_position_clamps() {
        let mut s = surface("Title", "hi");
        set_position(&mut s, Field::Body, Cursor::at(4, 9));
        assert_eq!(position(&s), Cursor::at(0, 2));
    }

    #[test]
    fn test_position_resolves_stale_caret() {
        let mut s = surface("Title", "hello\nworld");
        set_position(&mut s, Field::Body, Cursor::at(1, 5));
        s.document_mut().body = LineBuffer::from_text("x");
        assert_eq!(position(&s), Cursor::at(0, 1));
    }

    #[test]
    fn test_title_and_body_addressed_independently() {
        let mut s = surface("Title", "body");
        set_position(&mut s, Field::Title, Cursor::at(0, 2));
        assert_eq!(focus(&s), Field::Title);
        assert_eq!(absolute_position(&s), 2);
        set_absolute_position(&mut s, Field::Body, 4);
        assert_eq!(focus(&s), Field::Body);
        assert_eq!(position(&s), Cursor::at(0, 4));
    }

    #[test]
    fn test_start_and_end_predicates() {
        let mut s = surface("T", "ab\ncd");
        set_position(&mut s, Field::Body, Cursor::at(1, 0));
        assert!(at_start(&s, Scope::Line));
        assert!(!at_start(&s, Scope::Region));
        set_position(&mut s, Field::Body, Cursor::at(0, 2));
        assert!(at_end(&s, Scope::Line));
        assert!(!at_end(&s, Scope::Region));
        set_position(&mut s, Field::Body, Cursor::at(1, 2));
        assert!(at_end(&s, Scope::Region));
    }

    #[test]
    fn test_predicates_on_sentinel_line() {
        let mut s = surface("T", "");
        set_position(&mut s, Field::Body, Cursor::at(0, 0));
        assert!(at_start(&s, Scope::Line));
        assert!(at_end(&s, Scope::Line));
    }

    // --- Motions ---

    #[test]
    fn test_right_at_title_end_moves_to_body() {
        let mut s = surface("Title", "body");
        set_position(&mut s, Field::Title, Cursor::at(0, 5));
        assert!(move_caret(&mut s, Motion::Right));
        assert_eq!(s.caret(), Caret::body_start());
    }

    #[test]
    fn test_down_in_title_moves_to_body() {
        let mut s = surface("Title", "body");
        set_position(&mut s, Field::Title, Cursor::at(0, 1));
        move_caret(&mut s, Motion::Down);
        assert_eq!(s.caret(), Caret::body_start());
    }

    #[test]
    fn test_left_at_body_start_moves_to_title_end() {
        let mut s = surface("Title", "body");
        set_position(&mut s, Field::Body, Cursor::at(0, 0));
        move_caret(&mut s, Motion::Left);
        assert_eq!(s.caret(), Caret::new(Field::Title, Cursor::at(0, 5)));
    }

    #[test]
    fn test_up_at_body_start_moves_to_title_start() {
        let mut s = surface("Title", "body");
        set_position(&mut s, Field::Body, Cursor::at(0, 0));
        move_caret(&mut s, Motion::Up);
        assert_eq!(s.caret(), Caret::title_start());
    }

    #[test]
    fn test_left_and_right_wrap_between_body_lines() {
        let mut s = surface("T", "ab\ncd");
        set_position(&mut s, Field::Body, Cursor::at(1, 0));
        move_caret(&mut s, Motion::Left);
        assert_eq!(position(&s), Cursor::at(0, 2));
        move_caret(&mut s, Motion::Right);
        assert_eq!(position(&s), Cursor::at(1, 0));
    }

    #[test]
    fn test_right_at_document_end_does_not_move() {
        let mut s = surface("T", "ab");
        set_position(&mut s, Field::Body, Cursor::at(0, 2));
        assert!(!move_caret(&mut s, Motion::Right));
    }

    #[test]
    fn test_vertical_motion_clamps_offset() {
        let mut s = surface("T", "hello\nhi");
        set_position(&mut s, Field::Body, Cursor::at(0, 4));
        move_caret(&mut s, Motion::Down);
        assert_eq!(position(&s), Cursor::at(1, 2));
    }

    #[test]
    fn test_home_and_end() {
        let mut s = surface("T", "hello");
        set_position(&mut s, Field::Body, Cursor::at(0, 2));
        move_caret(&mut s, Motion::End);
        assert_eq!(position(&s), Cursor::at(0, 5));
        move_caret(&mut s, Motion::Home);
        assert_eq!(position(&s), Cursor::at(0, 0));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn absolute_round_trip(
                lines in proptest::collection::vec("[a-z]{0,6}", 1..6),
                line in 0..8usize,
                offset in 0..8usize,
            ) {
                let buf = LineBuffer::from_text(&lines.join("\n"));
                let cursor = Cursor::at(line, offset).clamped(&buf);
                let absolute = cursor.to_absolute(&buf);
                prop_assert!(absolute <= buf.total_len());
                prop_assert_eq!(Cursor::from_absolute(&buf, absolute), cursor);
            }
        }
    }
}
