use super::line::{Line, byte_index};

/// Ordered sequence of lines backing one editable region.
///
/// The buffer never holds zero lines: removing the last remaining line clears
/// it instead. Lines are only ever joined by an explicit
/// [`merge_with_next`](Self::merge_with_next) or
/// [`merge_with_prev`](Self::merge_with_prev).
///
/// All offsets are character offsets into a line's plain text. Every mutating
/// operation strips a highlight overlay from the lines it touches first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<Line>,
}

impl LineBuffer {
    /// A buffer with a single blank line.
    pub fn new() -> Self {
        Self {
            lines: vec![Line::blank()],
        }
    }

    /// Build a buffer from plain text, one line per `\n`-separated segment.
    pub fn from_text(text: &str) -> Self {
        Self::from_lines(split_lines(text).map(Line::plain).collect())
    }

    /// Build a buffer from server text, flagging lines that carry overlay markup.
    pub fn from_wire(text: &str) -> Self {
        Self::from_lines(split_lines(text).map(Line::from_wire).collect())
    }

    fn from_lines(lines: Vec<Line>) -> Self {
        if lines.is_empty() {
            Self::new()
        } else {
            Self { lines }
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, idx: usize) -> Option<&Line> {
        self.lines.get(idx)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Plain-text length of a line, zero when out of range.
    pub fn line_len(&self, idx: usize) -> usize {
        self.lines.get(idx).map_or(0, Line::len)
    }

    /// The whole region as plain text, lines joined by a single `\n`.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(Line::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Total plain-text length including one separator between lines.
    pub fn total_len(&self) -> usize {
        self.lines.iter().map(Line::len).sum::<usize>() + self.lines.len().saturating_sub(1)
    }

    /// Strip the overlay from one line. Returns `true` if anything changed.
    pub fn normalize_line(&mut self, idx: usize) -> bool {
        self.lines.get_mut(idx).is_some_and(Line::normalize)
    }

    /// Replace a line's text wholesale.
    pub fn set_line_text(&mut self, idx: usize, text: impl Into<String>) -> bool {
        let Some(line) = self.lines.get_mut(idx) else {
            return false;
        };
        line.set_text(text);
        true
    }

    /// Split a line at `offset`; the tail becomes a new line right after it.
    ///
    /// Returns the `(left, right)` texts, with `left + right` equal to the
    /// original text. The offset is clamped to the line length.
    pub fn split_at(&mut self, idx: usize, offset: usize) -> Option<(String, String)> {
        self.normalize_line(idx);
        let line = self.lines.get_mut(idx)?;
        let text = line.text().into_owned();
        let at = byte_index(&text, offset);
        let (left, right) = text.split_at(at);
        let (left, right) = (left.to_string(), right.to_string());
        line.set_text(left.clone());
        self.lines.insert(idx + 1, Line::plain(right.clone()));
        Some((left, right))
    }

    /// Append the next line onto this one and remove the next line.
    ///
    /// Returns the seam offset, i.e. this line's length before the merge.
    pub fn merge_with_next(&mut self, idx: usize) -> Option<usize> {
        if idx + 1 >= self.lines.len() {
            return None;
        }
        self.normalize_line(idx);
        self.normalize_line(idx + 1);
        let next = self.lines.remove(idx + 1);
        let line = &mut self.lines[idx];
        let seam = line.len();
        let merged = format!("{}{}", line.text(), next.text());
        line.set_text(merged);
        Some(seam)
    }

    /// Append this line onto the previous one and remove this line.
    ///
    /// Returns the seam offset within the previous line.
    pub fn merge_with_prev(&mut self, idx: usize) -> Option<usize> {
        if idx == 0 || idx >= self.lines.len() {
            return None;
        }
        self.merge_with_next(idx - 1)
    }

    /// Replace the characters in `start..end` of one line with `text`.
    ///
    /// `text` must not contain a separator. Offsets are clamped to the line.
    /// Returns the offset just past the inserted text.
    pub fn replace_range(
        &mut self,
        idx: usize,
        start: usize,
        end: usize,
        text: &str,
    ) -> Option<usize> {
        debug_assert!(!text.contains('\n'), "replace_range takes a single line");
        self.normalize_line(idx);
        let line = self.lines.get_mut(idx)?;
        let current = line.text().into_owned();
        let len = current.chars().count();
        let start = start.min(len);
        let end = end.clamp(start, len);
        let (start_byte, end_byte) = (byte_index(&current, start), byte_index(&current, end));
        let mut next = String::with_capacity(current.len() + text.len());
        next.push_str(&current[..start_byte]);
        next.push_str(text);
        next.push_str(&current[end_byte..]);
        line.set_text(next);
        Some(start + text.chars().count())
    }

    /// Insert `text` at the start of a line. Returns the inserted length.
    pub fn prepend(&mut self, idx: usize, text: &str) -> Option<usize> {
        self.replace_range(idx, 0, 0, text)
    }

    /// Append `text` at the end of a line. Returns the seam offset.
    pub fn append(&mut self, idx: usize, text: &str) -> Option<usize> {
        let seam = self.lines.get(idx)?.len();
        self.replace_range(idx, seam, seam, text)?;
        Some(seam)
    }

    /// Insert a line so that it ends up at index `idx` (clamped to the end).
    pub fn insert_line(&mut self, idx: usize, line: Line) {
        let idx = idx.min(self.lines.len());
        self.lines.insert(idx, line);
    }

    /// Remove a line. Removing the only line clears it instead.
    ///
    /// Returns the removed (or cleared) line.
    pub fn remove_line(&mut self, idx: usize) -> Option<Line> {
        if idx >= self.lines.len() {
            return None;
        }
        if self.lines.len() == 1 {
            return Some(std::mem::replace(&mut self.lines[0], Line::blank()));
        }
        Some(self.lines.remove(idx))
    }

    /// Reset to a single blank line.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.lines.push(Line::blank());
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(buf: &LineBuffer) -> Vec<String> {
        buf.lines().iter().map(|l| l.text().into_owned()).collect()
    }

    // --- Construction ---

    #[test]
    fn test_new_buffer_has_one_blank_line() {
        let buf = LineBuffer::new();
        assert_eq!(buf.line_count(), 1);
        assert!(buf.line(0).unwrap().is_sentinel());
        assert_eq!(buf.text(), "");
    }

    #[test]
    fn test_from_text_splits_on_separator() {
        let buf = LineBuffer::from_text("one\n\nthree");
        assert_eq!(texts(&buf), vec!["one", "", "three"]);
        assert!(buf.line(1).unwrap().is_sentinel());
        assert_eq!(buf.text(), "one\n\nthree");
    }

    #[test]
    fn test_from_text_drops_carriage_returns() {
        let buf = LineBuffer::from_text("a\r\nb");
        assert_eq!(texts(&buf), vec!["a", "b"]);
    }

    #[test]
    fn test_from_wire_flags_highlighted_lines() {
        let buf = LineBuffer::from_wire("plain\n<mark>hit</mark>");
        assert!(!buf.line(0).unwrap().is_highlighted());
        assert!(buf.line(1).unwrap().is_highlighted());
        assert_eq!(buf.text(), "plain\nhit");
    }

    #[test]
    fn test_total_len_counts_separators() {
        let buf = LineBuffer::from_text("ab\ncd\n");
        assert_eq!(buf.total_len(), 6);
    }

    // --- Split / merge ---

    #[test]
    fn test_split_at_middle() {
        let mut buf = LineBuffer::from_text("hello world");
        let (left, right) = buf.split_at(0, 5).unwrap();
        assert_eq!(left, "hello");
        assert_eq!(right, " world");
        assert_eq!(texts(&buf), vec!["hello", " world"]);
    }

    #[test]
    fn test_split_at_end_creates_blank_line() {
        let mut buf = LineBuffer::from_text("abc");
        buf.split_at(0, 3).unwrap();
        assert_eq!(buf.line_count(), 2);
        assert!(buf.line(1).unwrap().is_sentinel());
    }

    #[test]
    fn test_split_out_of_range_is_none() {
        let mut buf = LineBuffer::from_text("abc");
        assert!(buf.split_at(3, 0).is_none());
        assert_eq!(buf.line_count(), 1);
    }

    #[test]
    fn test_merge_with_next_reports_seam() {
        let mut buf = LineBuffer::from_text("foo\nbar\nbaz");
        assert_eq!(buf.merge_with_next(0), Some(3));
        assert_eq!(texts(&buf), vec!["foobar", "baz"]);
    }

    #[test]
    fn test_merge_with_next_on_last_line_is_none() {
        let mut buf = LineBuffer::from_text("foo\nbar");
        assert_eq!(buf.merge_with_next(1), None);
        assert_eq!(buf.line_count(), 2);
    }

    #[test]
    fn test_merge_with_prev_reports_seam_in_previous_line() {
        let mut buf = LineBuffer::from_text("foo\nbar");
        assert_eq!(buf.merge_with_prev(1), Some(3));
        assert_eq!(texts(&buf), vec!["foobar"]);
    }

    #[test]
    fn test_merge_with_prev_on_first_line_is_none() {
        let mut buf = LineBuffer::from_text("foo\nbar");
        assert_eq!(buf.merge_with_prev(0), None);
    }

    #[test]
    fn test_merge_blank_lines_keeps_sentinel() {
        let mut buf = LineBuffer::from_text("\n");
        assert_eq!(buf.merge_with_next(0), Some(0));
        assert_eq!(buf.line_count(), 1);
        assert!(buf.line(0).unwrap().is_sentinel());
    }

    #[test]
    fn test_merge_strips_overlay_from_both_lines() {
        let mut buf = LineBuffer::from_wire("<mark>ab</mark>\nc<mark>d</mark>");
        assert_eq!(buf.merge_with_next(0), Some(2));
        let line = buf.line(0).unwrap();
        assert!(!line.is_highlighted());
        assert_eq!(line.content(), "abcd");
    }

    // --- Replace / prepend / append ---

    #[test]
    fn test_replace_range_inserts() {
        let mut buf = LineBuffer::from_text("hd");
        assert_eq!(buf.replace_range(0, 1, 1, "ello worl"), Some(10));
        assert_eq!(buf.text(), "hello world");
    }

    #[test]
    fn test_replace_range_deletes() {
        let mut buf = LineBuffer::from_text("hello");
        assert_eq!(buf.replace_range(0, 1, 4, ""), Some(1));
        assert_eq!(buf.text(), "ho");
    }

    #[test]
    fn test_replace_range_to_empty_leaves_sentinel() {
        let mut buf = LineBuffer::from_text("x");
        buf.replace_range(0, 0, 1, "").unwrap();
        assert!(buf.line(0).unwrap().is_sentinel());
    }

    #[test]
    fn test_replace_range_into_sentinel_line() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.replace_range(0, 0, 0, "a"), Some(1));
        assert_eq!(buf.line(0).unwrap().content(), "a");
    }

    #[test]
    fn test_replace_range_clamps_offsets() {
        let mut buf = LineBuffer::from_text("abc");
        assert_eq!(buf.replace_range(0, 10, 20, "!"), Some(4));
        assert_eq!(buf.text(), "abc!");
    }

    #[test]
    fn test_replace_range_multibyte() {
        let mut buf = LineBuffer::from_text("café");
        buf.replace_range(0, 3, 4, "e").unwrap();
        assert_eq!(buf.text(), "cafe");
    }

    #[test]
    fn test_prepend_and_append() {
        let mut buf = LineBuffer::from_text("mid");
        assert_eq!(buf.prepend(0, ">>"), Some(2));
        assert_eq!(buf.append(0, "<<"), Some(5));
        assert_eq!(buf.text(), ">>mid<<");
    }

    // --- Insert / remove ---

    #[test]
    fn test_insert_line_clamps_index() {
        let mut buf = LineBuffer::from_text("a");
        buf.insert_line(99, Line::plain("b"));
        assert_eq!(texts(&buf), vec!["a", "b"]);
    }

    #[test]
    fn test_remove_last_remaining_line_clears_it() {
        let mut buf = LineBuffer::from_text("only");
        let removed = buf.remove_line(0).unwrap();
        assert_eq!(removed.text(), "only");
        assert_eq!(buf.line_count(), 1);
        assert!(buf.line(0).unwrap().is_sentinel());
    }

    #[test]
    fn test_remove_line_out_of_range() {
        let mut buf = LineBuffer::from_text("a\nb");
        assert!(buf.remove_line(2).is_none());
        assert_eq!(buf.line_count(), 2);
    }

    #[test]
    fn test_clear_resets_to_single_blank() {
        let mut buf = LineBuffer::from_text("a\nb\nc");
        buf.clear();
        assert_eq!(buf, LineBuffer::new());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn split_then_merge_restores_line(content in "[a-zé ]{0,24}", k in 0..30usize) {
                let mut buf = LineBuffer::from_text(&content);
                let k = k.min(content.chars().count());
                let (left, right) = buf.split_at(0, k).unwrap();
                prop_assert_eq!(format!("{left}{right}"), content.clone());
                let seam = buf.merge_with_next(0).unwrap();
                prop_assert_eq!(seam, k);
                prop_assert_eq!(buf.line_count(), 1);
                prop_assert_eq!(buf.text(), content);
            }

            #[test]
            fn replace_range_preserves_surroundings(
                content in "[a-z]{0,24}",
                insert in "[A-Z]{0,8}",
                at in 0..30usize,
            ) {
                let mut buf = LineBuffer::from_text(&content);
                let at = at.min(content.len());
                let end = buf.replace_range(0, at, at, &insert).unwrap();
                prop_assert_eq!(end, at + insert.len());
                let text = buf.text();
                prop_assert_eq!(&text[..at], &content[..at]);
                prop_assert_eq!(&text[at..end], insert.as_str());
                prop_assert_eq!(&text[end..], &content[at..]);
            }

            #[test]
            fn buffer_never_empties(ops in proptest::collection::vec(0..3u8, 0..20)) {
                let mut buf = LineBuffer::from_text("a\nb");
                for op in ops {
                    match op {
                        0 => { buf.remove_line(0); }
                        1 => { buf.merge_with_next(0); }
                        _ => { buf.split_at(0, 1); }
                    }
                    prop_assert!(buf.line_count() >= 1);
                }
            }
        }
    }
}
