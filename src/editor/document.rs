use super::buffer::LineBuffer;
use super::cursor::Field;

/// A note as the editor holds it.
///
/// The document is replaced wholesale whenever the server sends a new one; it
/// is never diffed against the previous content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Server-side identifier; `None` until the server assigns one.
    pub file: Option<String>,
    /// Single-line title region.
    pub title: LineBuffer,
    /// Tag labels in display order. Duplicates are kept.
    pub tags: Vec<String>,
    /// Multi-line body region.
    pub body: LineBuffer,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from the fields of an inbound `text` message.
    pub fn from_wire(file: &str, title: &str, tags: &[String], body: &str) -> Self {
        let body = body.replace("\r\n", "\n");
        Self {
            file: Some(file.to_string()),
            title: LineBuffer::from_text(&single_line(title)),
            tags: tags.to_vec(),
            body: LineBuffer::from_wire(&body),
        }
    }

    pub fn region(&self, field: Field) -> &LineBuffer {
        match field {
            Field::Title => &self.title,
            Field::Body => &self.body,
        }
    }

    pub fn region_mut(&mut self, field: Field) -> &mut LineBuffer {
        match field {
            Field::Title => &mut self.title,
            Field::Body => &mut self.body,
        }
    }

    pub fn title_text(&self) -> String {
        self.title.text()
    }

    pub fn body_text(&self) -> String {
        self.body.text()
    }
}

/// Collapse separators so text fits the single-line title.
pub(crate) fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
