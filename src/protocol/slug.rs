use std::sync::LazyLock;

use regex::Regex;

static NON_WORD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W+").expect("non-word pattern is valid"));

/// Derive a document identifier from free text.
///
/// Lowercases and trims, then collapses every run of non-word characters into
/// a single `_`. Used only when the client proposes an identifier
/// (`create_or_open`); identifiers assigned by the server are taken verbatim.
pub fn normalize_identifier(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    NON_WORD_RUN.replace_all(&lowered, "_").into_owned()
}
