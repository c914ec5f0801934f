//! Censored-word set: a case-folded membership test for forbidden words.
//!
//! Loaded once at startup from a whitespace-separated token file and shared
//! read-only across all workers, so no locking is needed.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;

/// Bounded token width. A whitespace-delimited run longer than this is
/// split into successive tokens of at most this many bytes; no byte of the
/// run is discarded.
const MAX_TOKEN_LEN: usize = 255;

/// Set of forbidden words. Matching is ASCII case-insensitive.
#[derive(Debug, Default)]
pub struct CensoredSet {
    words: FxHashSet<String>,
}

impl CensoredSet {
    /// The empty set: nothing is censored.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a whitespace-separated token file, lowercasing every token.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read censored set {}", path.display()))?;
        Ok(Self::from_tokens(&text))
    }

    fn from_tokens(text: &str) -> Self {
        let mut words = FxHashSet::default();
        for run in text.split_ascii_whitespace() {
            let mut rest = run;
            // A bounded-width read: each pass takes 255 bytes, the tail of
            // the run carries over as the next token. The boundary check
            // only fails on non-ASCII input; the remainder then stays whole.
            while rest.len() > MAX_TOKEN_LEN && rest.is_char_boundary(MAX_TOKEN_LEN) {
                let (token, tail) = rest.split_at(MAX_TOKEN_LEN);
                words.insert(token.to_ascii_lowercase());
                rest = tail;
            }
            words.insert(rest.to_ascii_lowercase());
        }
        Self { words }
    }

    /// Build a set from literal words. Test scaffolding.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Is `word` censored? ASCII case-insensitive.
    pub fn contains(&self, word: &str) -> bool {
        if self.words.is_empty() {
            return false;
        }
        self.words.contains(&word.to_ascii_lowercase())
    }

    /// Number of censored words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
