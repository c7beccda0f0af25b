//! Sentence-aware chunking with token budgets and overlap.
//!
//! Text is normalized, split into sentences, and packed greedily into chunks of
//! at most `max_tokens` tokens. Each new chunk starts with the trailing
//! `overlap` tokens of the previous one so that context spanning a boundary is
//! retrievable from either side.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::tokenize::{count_tokens, normalize, token_starts};

/// Slack allowed above `max_tokens` for an emitted chunk.
pub const CHUNK_SLACK: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    pub max_tokens: usize,
    pub overlap: usize,
    pub min_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { max_tokens: 200, overlap: 60, min_tokens: 20 }
    }
}

impl ChunkerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(Error::InvalidConfig("chunker.max_tokens must be greater than 0".into()));
        }
        if self.overlap >= self.max_tokens {
            return Err(Error::InvalidConfig(format!(
                "chunker.overlap ({}) must be smaller than chunker.max_tokens ({})",
                self.overlap, self.max_tokens
            )));
        }
        if self.min_tokens > self.max_tokens {
            return Err(Error::InvalidConfig(format!(
                "chunker.min_tokens ({}) must not exceed chunker.max_tokens ({})",
                self.min_tokens, self.max_tokens
            )));
        }
        Ok(())
    }

    fn upper_bound(&self) -> usize {
        self.max_tokens + CHUNK_SLACK
    }
}

fn sentence_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").expect("valid sentence regex"))
}

fn clause_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[;:]\s+").expect("valid clause regex"))
}

/// Split after `.`, `!` or `?` when whitespace and an uppercase letter follow.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in sentence_end().find_iter(text) {
        let next_is_upper = text[m.end()..].chars().next().is_some_and(char::is_uppercase);
        if !next_is_upper {
            continue;
        }
        // punctuation is a single ASCII byte at m.start()
        push_sentence(&mut sentences, &text[start..=m.start()]);
        start = m.end();
    }
    if start == 0 {
        let whole = text.trim();
        return if whole.is_empty() { Vec::new() } else { vec![whole.to_string()] };
    }
    push_sentence(&mut sentences, &text[start..]);
    sentences
}

fn push_sentence(out: &mut Vec<String>, raw: &str) {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        out.push(collapsed);
    }
}

fn first_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

/// Suffix of `text` starting at its n-th token from the end. A cut may fall
/// inside a hyphenated word.
fn last_tokens(text: &str, n: usize) -> &str {
    let starts = token_starts(text);
    if n == 0 || starts.is_empty() {
        return "";
    }
    &text[starts[starts.len().saturating_sub(n)]..]
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk one document's text. Blank text yields no chunks; any other text
    /// yields at least one.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut packer = Packer::new(&self.config);
        for sentence in split_sentences(&normalized) {
            let tokens = count_tokens(&sentence);
            if tokens <= self.config.max_tokens {
                packer.push(sentence, tokens);
                continue;
            }
            for piece in clause_break().split(&sentence) {
                let mut piece = piece.trim().to_string();
                if piece.is_empty() {
                    continue;
                }
                let mut piece_tokens = count_tokens(&piece);
                if piece_tokens > self.config.max_tokens {
                    piece = first_words(&piece, self.config.max_tokens);
                    piece_tokens = count_tokens(&piece);
                }
                packer.push(piece, piece_tokens);
            }
        }
        let chunks = packer.finish();

        let (min, max) = (self.config.min_tokens, self.config.upper_bound());
        let kept: Vec<String> = chunks
            .into_iter()
            .filter(|c| (min..=max).contains(&count_tokens(c)))
            .collect();
        if !kept.is_empty() {
            return kept;
        }

        let fallback = first_words(&normalized, self.config.max_tokens);
        if fallback.is_empty() {
            Vec::new()
        } else {
            vec![fallback]
        }
    }
}

struct Packer<'a> {
    config: &'a ChunkerConfig,
    buffer: Vec<String>,
    buffer_tokens: usize,
    chunks: Vec<String>,
}

impl<'a> Packer<'a> {
    fn new(config: &'a ChunkerConfig) -> Self {
        Self { config, buffer: Vec::new(), buffer_tokens: 0, chunks: Vec::new() }
    }

    fn push(&mut self, sentence: String, tokens: usize) {
        if self.buffer_tokens + tokens <= self.config.max_tokens {
            self.buffer.push(sentence);
            self.buffer_tokens += tokens;
            return;
        }
        self.flush();
        self.seed_overlap(tokens);
        self.buffer.push(sentence);
        self.buffer_tokens += tokens;
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        if self.buffer_tokens >= self.config.min_tokens {
            let text = self.buffer.join(" ");
            self.chunks.push(first_words(&text, self.config.upper_bound()));
        }
        self.buffer.clear();
        self.buffer_tokens = 0;
    }

    // Trailing tokens of the last emitted chunk, shortened so the incoming
    // sentence still fits in max_tokens.
    fn seed_overlap(&mut self, incoming_tokens: usize) {
        let Some(previous) = self.chunks.last() else {
            return;
        };
        let room = self.config.max_tokens.saturating_sub(incoming_tokens);
        let tail = last_tokens(previous, self.config.overlap.min(room));
        if tail.is_empty() {
            return;
        }
        let tail = tail.to_string();
        self.buffer_tokens = count_tokens(&tail);
        self.buffer.push(tail);
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_only_before_uppercase() {
        let parts = split_sentences("Version 2.0 shipped. Then v. small fix! Done? yes");
        assert_eq!(parts, vec!["Version 2.0 shipped.", "Then v. small fix!", "Done? yes"]);
    }

    #[test]
    fn no_boundary_is_one_sentence() {
        assert_eq!(split_sentences("  just one run of text "), vec!["just one run of text"]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn last_tokens_counts_tokens_not_words() {
        assert_eq!(last_tokens("a b", 5), "a b");
        assert_eq!(last_tokens("a b c d.", 2), "c d.");
        assert_eq!(last_tokens("uses a state-of-the-art grid - now", 4), "the-art grid - now");
        assert_eq!(last_tokens("a b", 0), "");
        assert_eq!(last_tokens("- ;", 3), "");
    }
}
