//! Ranked search results and keyboard selection over them.
//!
//! The list is replaced wholesale by every inbound `results` message; there is
//! no merging with earlier lists, so a late response simply wins.

use serde::{Deserialize, Deserializer};

/// Snippet lines shown per entry unless configured otherwise.
pub const DEFAULT_MAX_SNIPPETS: usize = 5;

/// Label of a snippet line; the server sends either text or a line number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SnippetLabel {
    Text(String),
    Number(i64),
}

/// One `(label, text)` line of match context, a two-element array on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub label: String,
    pub text: String,
}

impl<'de> Deserialize<'de> for Snippet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (label, text) = <(SnippetLabel, String)>::deserialize(deserializer)?;
        let label = match label {
            SnippetLabel::Text(label) => label,
            SnippetLabel::Number(n) => n.to_string(),
        };
        Ok(Self { label, text })
    }
}

impl Snippet {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// Display form, `label: text`.
    pub fn display(&self) -> String {
        format!("{}: {}", self.label, self.text)
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResultEntry {
    pub file: String,
    #[serde(rename = "num", default)]
    pub match_count: u64,
    #[serde(rename = "text", default)]
    pub snippet_lines: Vec<Snippet>,
    /// Query that produced this entry; empty when the server did not echo it.
    #[serde(rename = "query", default)]
    pub query_echo: String,
}

impl ResultEntry {
    pub fn new(file: impl Into<String>, match_count: u64) -> Self {
        Self {
            file: file.into(),
            match_count,
            snippet_lines: Vec::new(),
            query_echo: String::new(),
        }
    }

    #[must_use]
    pub fn with_snippet(mut self, label: impl Into<String>, text: impl Into<String>) -> Self {
        self.snippet_lines.push(Snippet::new(label, text));
        self
    }

    /// Header line, `file (count)`.
    pub fn header(&self) -> String {
        format!("{} ({})", self.file, self.match_count)
    }

    /// The first `max` snippet lines.
    pub fn visible_snippets(&self, max: usize) -> &[Snippet] {
        &self.snippet_lines[..self.snippet_lines.len().min(max)]
    }
}

/// Result list with a clamped selection marker and a scroll offset in entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultList {
    entries: Vec<ResultEntry>,
    selected: Option<usize>,
    scroll_offset: usize,
}

impl ResultList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list. Clears the selection and scrolls back to the top.
    ///
    /// Entries without a query echo inherit `query`, the last query sent.
    pub fn replace(&mut self, mut entries: Vec<ResultEntry>, query: &str) {
        for entry in &mut entries {
            if entry.query_echo.is_empty() {
                entry.query_echo = query.to_string();
            }
        }
        self.entries = entries;
        self.selected = None;
        self.scroll_offset = 0;
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&ResultEntry> {
        self.selected.and_then(|idx| self.entries.get(idx))
    }

    pub const fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Move the marker down, clamping at the last entry.
    ///
    /// From no selection this selects the first entry. Returns `true` if the
    /// selection changed.
    pub fn select_next(&mut self) -> bool {
        let next = match self.selected {
            None if self.entries.is_empty() => return false,
            None => 0,
            Some(idx) => (idx + 1).min(self.entries.len() - 1),
        };
        self.set_selected(next)
    }

    /// Move the marker up, clamping at the first entry. No-op without a selection.
    pub fn select_previous(&mut self) -> bool {
        match self.selected {
            Some(idx) => self.set_selected(idx.saturating_sub(1)),
            None => false,
        }
    }

    /// Select an entry directly, e.g. by mouse. Out-of-range indices are ignored.
    pub fn select(&mut self, idx: usize) -> bool {
        if idx >= self.entries.len() {
            return false;
        }
        self.set_selected(idx)
    }

    fn set_selected(&mut self, idx: usize) -> bool {
        let changed = self.selected != Some(idx);
        self.selected = Some(idx);
        changed
    }

    /// Adjust the scroll offset so the selection lies within `visible` entries.
    pub fn ensure_visible(&mut self, visible: usize) {
        let Some(idx) = self.selected else {
            return;
        };
        let visible = visible.max(1);
        if idx < self.scroll_offset {
            self.scroll_offset = idx;
        } else if idx >= self.scroll_offset + visible {
            self.scroll_offset = idx + 1 - visible;
        }
    }

    /// Rewrite the identifier of every entry for `from`. Returns how many changed.
    pub fn rename(&mut self, from: &str, to: &str) -> usize {
        let mut renamed = 0;
        for entry in self.entries.iter_mut().filter(|e| e.file == from) {
            entry.file = to.to_string();
            renamed += 1;
        }
        renamed
    }

    /// Drop every entry for `file`, keeping the selection on the same entry
    /// when it survives.
    pub fn remove(&mut self, file: &str) -> bool {
        let before = self.entries.len();
        let selected_file = self.selected().map(|e| e.file.clone());
        self.entries.retain(|e| e.file != file);
        if self.entries.len() == before {
            return false;
        }
        self.selected = selected_file
            .filter(|f| f != file)
            .and_then(|f| self.entries.iter().position(|e| e.file == f));
        self.scroll_offset = self
            .scroll_offset
            .min(self.entries.len().saturating_sub(1));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(files: &[&str]) -> ResultList {
        let mut list = ResultList::new();
        list.replace(
            files.iter().map(|f| ResultEntry::new(*f, 1)).collect(),
            "q",
        );
        list
    }

    #[test]
    fn test_deserialize_entry_from_wire() {
        let json = r#"{"file": "notes/a", "num": 3, "text": [["title", "A"], [12, "line"]]}"#;
        let entry: ResultEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.file, "notes/a");
        assert_eq!(entry.match_count, 3);
        assert_eq!(
            entry.snippet_lines,
            vec![Snippet::new("title", "A"), Snippet::new("12", "line")]
        );
        assert_eq!(entry.query_echo, "");
    }

    #[test]
    fn test_header_and_visible_snippets() {
        let mut entry = ResultEntry::new("f", 7);
        for i in 0..8 {
            entry = entry.with_snippet(i.to_string(), "x");
        }
        assert_eq!(entry.header(), "f (7)");
        assert_eq!(entry.visible_snippets(DEFAULT_MAX_SNIPPETS).len(), 5);
        assert_eq!(entry.visible_snippets(20).len(), 8);
        assert_eq!(entry.snippet_lines[0].display(), "0: x");
    }

    #[test]
    fn test_select_next_from_nothing_selects_first() {
        let mut l = list(&["a", "b"]);
        assert!(l.select_next());
        assert_eq!(l.selected_index(), Some(0));
    }

    #[test]
    fn test_select_previous_from_nothing_is_noop() {
        let mut l = list(&["a", "b"]);
        assert!(!l.select_previous());
        assert_eq!(l.selected_index(), None);
    }

    #[test]
    fn test_selection_clamps_at_both_ends() {
        let mut l = list(&["a", "b"]);
        let _ = l.select_next();
        let _ = l.select_next();
        assert!(!l.select_next());
        assert_eq!(l.selected_index(), Some(1));
        let _ = l.select_previous();
        assert!(!l.select_previous());
        assert_eq!(l.selected_index(), Some(0));
    }

    #[test]
    fn test_select_next_on_empty_list() {
        let mut l = ResultList::new();
        assert!(!l.select_next());
        assert!(l.selected().is_none());
    }

    #[test]
    fn test_replace_clears_selection_and_scroll() {
        let mut l = list(&["a", "b", "c", "d"]);
        let _ = l.select(3);
        l.ensure_visible(2);
        assert_eq!(l.scroll_offset(), 2);
        l.replace(vec![ResultEntry::new("z", 1)], "q2");
        assert_eq!(l.selected_index(), None);
        assert_eq!(l.scroll_offset(), 0);
        assert_eq!(l.entries()[0].query_echo, "q2");
    }

    #[test]
    fn test_replace_with_same_payload_is_idempotent() {
        let entries = vec![ResultEntry::new("a", 1), ResultEntry::new("b", 2)];
        let mut l = ResultList::new();
        l.replace(entries.clone(), "q");
        let _ = l.select_next();
        l.replace(entries.clone(), "q");
        let first = l.clone();
        l.replace(entries, "q");
        assert_eq!(l, first);
        assert_eq!(l.selected_index(), None);
    }

    #[test]
    fn test_replace_keeps_server_query_echo() {
        let mut entry = ResultEntry::new("a", 1);
        entry.query_echo = "server".to_string();
        let mut l = ResultList::new();
        l.replace(vec![entry], "local");
        assert_eq!(l.entries()[0].query_echo, "server");
    }

    #[test]
    fn test_ensure_visible_scrolls_up_and_down() {
        let mut l = list(&["a", "b", "c", "d", "e"]);
        let _ = l.select(4);
        l.ensure_visible(2);
        assert_eq!(l.scroll_offset(), 3);
        let _ = l.select(1);
        l.ensure_visible(2);
        assert_eq!(l.scroll_offset(), 1);
    }

    #[test]
    fn test_rename_rewrites_matching_entries() {
        let mut l = list(&["a", "b", "a"]);
        assert_eq!(l.rename("a", "z"), 2);
        let files: Vec<_> = l.entries().iter().map(|e| e.file.as_str()).collect();
        assert_eq!(files, vec!["z", "b", "z"]);
    }

    #[test]
    fn test_remove_keeps_surviving_selection() {
        let mut l = list(&["a", "b", "c"]);
        let _ = l.select(2);
        assert!(l.remove("a"));
        assert_eq!(l.selected().map(|e| e.file.as_str()), Some("c"));
    }

    #[test]
    fn test_remove_selected_clears_selection() {
        let mut l = list(&["a", "b"]);
        let _ = l.select(1);
        assert!(l.remove("b"));
        assert_eq!(l.selected_index(), None);
        assert!(!l.remove("missing"));
    }
}
