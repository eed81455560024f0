use super::cursor::Caret;
use super::document::Document;

/// The editable surface the edit engine drives.
///
/// This is the only seam between editing logic and whatever displays the
/// text: read and write the caret, read and write line content. The caret a
/// surface reports may be stale relative to its content; callers resolve it
/// through [`cursor::position`](super::cursor::position).
pub trait Surface {
    fn document(&self) -> &Document;

    fn document_mut(&mut self) -> &mut Document;

    /// Caret exactly as last placed.
    fn caret(&self) -> Caret;

    fn place_caret(&mut self, caret: Caret);

    /// Swap in a freshly loaded document and put the caret at the body start.
    fn replace_document(&mut self, document: Document) {
        *self.document_mut() = document;
        self.place_caret(Caret::body_start());
    }
}

/// In-memory surface with no rendering attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadlessSurface {
    document: Document,
    caret: Caret,
}

impl HeadlessSurface {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            caret: Caret::body_start(),
        }
    }
}

impl Surface for HeadlessSurface {
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
    }
}
