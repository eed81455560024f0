use crate::editor::{Caret, Document, Field, Surface};

/// Surface backing the terminal document pane.
///
/// Besides the document and caret it owns the body scroll offset, which
/// follows the caret so the caret line is always on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalSurface {
    document: Document,
    caret: Caret,
    scroll_offset: usize,
    body_rows: usize,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self {
            document: Document::new(),
            caret: Caret::body_start(),
            scroll_offset: 0,
            body_rows: 1,
        }
    }

    /// First body line on screen.
    pub const fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub const fn body_rows(&self) -> usize {
        self.body_rows
    }

    /// Set how many body lines fit on screen.
    pub fn set_body_rows(&mut self, rows: usize) {
        self.body_rows = rows.max(1);
        self.follow_caret();
    }

    fn follow_caret(&mut self) {
        if self.caret.field != Field::Body {
            return;
        }
        let line = self.caret.cursor.line;
        if line < self.scroll_offset {
            self.scroll_offset = line;
        } else if line >= self.scroll_offset + self.body_rows {
            self.scroll_offset = line + 1 - self.body_rows;
        }
    }
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for TerminalSurface {
    fn document(&self) -> &Document {
        &self.document
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    fn caret(&self) -> Caret {
        self.caret
    }

    fn place_caret(&mut self, caret: Caret) {
        self.caret = caret;
        self.follow_caret();
    }

    fn replace_document(&mut self, document: Document) {
        self.document = document;
        self.caret = Caret::body_start();
        self.scroll_offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Cursor, set_position};

    fn surface(lines: usize, rows: usize) -> TerminalSurface {
        let body = vec!["x"; lines].join("\n");
        let mut s = TerminalSurface::new();
        s.replace_document(Document::from_wire("f", "t", &[], &body));
        s.set_body_rows(rows);
        s
    }

    #[test]
    fn test_scroll_follows_caret_down_and_up() {
        let mut s = surface(50, 10);
        set_position(&mut s, Field::Body, Cursor::at(25, 0));
        assert_eq!(s.scroll_offset(), 16);
        set_position(&mut s, Field::Body, Cursor::at(3, 0));
        assert_eq!(s.scroll_offset(), 3);
    }

    #[test]
    fn test_title_caret_keeps_scroll() {
        let mut s = surface(50, 10);
        set_position(&mut s, Field::Body, Cursor::at(30, 0));
        let before = s.scroll_offset();
        set_position(&mut s, Field::Title, Cursor::at(0, 0));
        assert_eq!(s.scroll_offset(), before);
    }

    #[test]
    fn test_replace_document_resets_scroll_and_caret() {
        let mut s = surface(50, 10);
        set_position(&mut s, Field::Body, Cursor::at(40, 0));
        s.replace_document(Document::from_wire("g", "t", &[], "body"));
        assert_eq!(s.scroll_offset(), 0);
        assert_eq!(s.caret(), Caret::body_start());
    }
}
