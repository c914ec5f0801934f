//! Sentence-aware tokenizer driving the index.
//!
//! A file is read whole, split into sentences on `.`, `?`, `!` (terminator
//! included in the context), and each sentence is either skipped outright
//! (it contains a censored word) or every word in it is inserted into the
//! index with the sentence as context. Words are maximal runs of ASCII
//! alphabetic characters; case is preserved for insertion and folded only
//! for the censorship test.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use memchr::memchr3;
use tracing::debug;

use crate::censor::CensoredSet;
use crate::index::SearchIndex;

/// Iterator over the sentences of a text.
///
/// Each item is the sentence with its terminator, leading whitespace
/// stripped and embedded newlines collapsed to spaces. Trailing text with
/// no terminator is ignored.
pub struct Sentences<'a> {
    text: &'a str,
    pos: usize,
}

impl Iterator for Sentences<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return None;
        }

        let start = self.pos;
        let end = match memchr3(b'.', b'?', b'!', &bytes[start..]) {
            Some(off) => start + off,
            None => {
                self.pos = bytes.len();
                return None;
            }
        };
        self.pos = end + 1;

        let context = self.text[start..=end]
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        Some(context)
    }
}

/// Split `text` into sentence contexts.
pub fn sentences(text: &str) -> Sentences<'_> {
    Sentences { text, pos: 0 }
}

/// The words of a sentence: maximal ASCII-alphabetic runs, case preserved.
pub fn words(context: &str) -> impl Iterator<Item = &str> {
    context
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| !w.is_empty())
}

/// Read `path` and index every word of every non-censored sentence.
pub fn tokenize_file(path: &Path, index: &SearchIndex, censored: &CensoredSet) -> Result<()> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    tokenize_text(&path.to_string_lossy(), &text, index, censored);
    Ok(())
}

/// Index `text` attributed to `file`. Split out of [`tokenize_file`] so the
/// pipeline can be exercised without touching the filesystem.
pub fn tokenize_text(file: &str, text: &str, index: &SearchIndex, censored: &CensoredSet) {
    for context in sentences(text) {
        if words(&context).any(|w| censored.contains(w)) {
            debug!(file, context = %context, "skipping censored sentence");
            continue;
        }
        for word in words(&context) {
            index.insert(word, file, &context);
        }
    }
}
