use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Content of a blank line as the surface stores it.
///
/// A blank row keeps a lone break marker so it still occupies screen space.
/// Offset arithmetic treats it as zero-length.
pub const EMPTY_LINE_SENTINEL: &str = "\n";

static OVERLAY_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?mark(\s[^>]*)?>").expect("overlay pattern is valid"));

/// One addressable line of a document region.
///
/// A line may still carry a highlight overlay (search-match markup from the
/// server). Offsets are always measured on the plain text, so an overlay never
/// shifts the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    content: String,
    highlighted: bool,
}

impl Line {
    /// A plain line. The text is taken literally, markup included.
    pub fn plain(text: impl Into<String>) -> Self {
        let mut line = Self {
            content: String::new(),
            highlighted: false,
        };
        line.set_text(text);
        line
    }

    /// A blank line holding the empty-line sentinel.
    pub fn blank() -> Self {
        Self {
            content: EMPTY_LINE_SENTINEL.to_string(),
            highlighted: false,
        }
    }

    /// A line as received from the server, flagged when it carries overlay markup.
    pub fn from_wire(text: &str) -> Self {
        if OVERLAY_MARKUP.is_match(text) {
            Self {
                content: text.to_string(),
                highlighted: true,
            }
        } else {
            Self::plain(text)
        }
    }

    /// Raw stored content, overlay markup and sentinel included.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub const fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn is_sentinel(&self) -> bool {
        self.content == EMPTY_LINE_SENTINEL
    }

    /// The semantic text: sentinel reads as empty, overlay markup is stripped.
    pub fn text(&self) -> Cow<'_, str> {
        if self.is_sentinel() {
            Cow::Borrowed("")
        } else if self.highlighted {
            OVERLAY_MARKUP.replace_all(&self.content, "")
        } else {
            Cow::Borrowed(&self.content)
        }
    }

    /// Length in characters of the semantic text.
    pub fn len(&self) -> usize {
        self.text().chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the content with plain text. Empty text becomes the sentinel.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.highlighted = false;
        self.content = if text.is_empty() {
            EMPTY_LINE_SENTINEL.to_string()
        } else {
            text
        };
    }

    /// Strip the highlight overlay, keeping the plain text.
    ///
    /// Returns `true` if the line carried an overlay.
    pub fn normalize(&mut self) -> bool {
        if !self.highlighted {
            return false;
        }
        let plain = self.text().into_owned();
        self.set_text(plain);
        true
    }

    /// Plain-text ranges covered by the overlay, in character offsets.
    pub fn overlay_ranges(&self) -> Vec<std::ops::Range<usize>> {
        if !self.highlighted {
            return Vec::new();
        }
        let mut ranges = Vec::new();
        let mut plain_offset = 0;
        let mut open_at = None;
        let mut last = 0;
        for tag in OVERLAY_MARKUP.find_iter(&self.content) {
            plain_offset += self.content[last..tag.start()].chars().count();
            last = tag.end();
            if tag.as_str().starts_with("</") {
                if let Some(start) = open_at.take() {
                    ranges.push(start..plain_offset);
                }
            } else if open_at.is_none() {
                open_at = Some(plain_offset);
            }
        }
        ranges
    }
}

impl Default for Line {
    fn default() -> Self {
        Self::blank()
    }
}

/// Byte index of a character offset, clamped to the end of `text`.
pub(crate) fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map_or(text.len(), |(idx, _)| idx)
}
