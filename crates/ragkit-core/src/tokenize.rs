//! Text normalization and the single tokenizer shared by chunking and BM25.

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

fn hyphen_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\w)-\r?\n(\w)").expect("valid hyphen-break regex"))
}

fn token_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z0-9áéíóúüñ]+").expect("valid token regex"))
}

/// NFKC, NBSP to space, soft hyphens dropped, `word-\nword` rejoined, whitespace collapsed.
pub fn normalize(text: &str) -> String {
    let composed: String = text
        .nfkc()
        .filter(|c| *c != '\u{00AD}')
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect();
    let joined = hyphen_break().replace_all(&composed, "$1$2");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased alphanumeric runs of the normalized text.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = normalize(text).to_lowercase();
    token_run().find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}

pub fn count_tokens(text: &str) -> usize {
    let lowered = normalize(text).to_lowercase();
    token_run().find_iter(&lowered).count()
}

/// Byte offset in `text` where each token begins. `text` must already be
/// normalized; offsets point into it, not into its lowercased form.
pub fn token_starts(text: &str) -> Vec<usize> {
    let mut lowered = String::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());
    for (offset, c) in text.char_indices() {
        for lower in c.to_lowercase() {
            lowered.push(lower);
            origin.resize(lowered.len(), offset);
        }
    }
    token_run().find_iter(&lowered).map(|m| origin[m.start()]).collect()
}
