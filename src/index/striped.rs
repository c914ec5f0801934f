//! Concurrent striped hash index mapping words to their occurrences.
//!
//! The table is an array of buckets, each guarded by its own readers-writer
//! lock, so inserts for different words proceed in parallel. A second,
//! table-level `RwLock` acts as the resize barrier: every insert and lookup
//! holds it in shared mode while dereferencing the bucket array, and the
//! rehash path upgrades to exclusive mode to swap the array out. Item count
//! is kept in an atomic so the load-factor check stays off the lock path.

use std::hash::Hasher;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use fnv::FnvHasher;

/// Initial bucket count when none is configured.
pub const DEFAULT_BUCKETS: usize = 4096;

/// Rehash when `n_items / capacity` reaches 3/4, expressed as a ratio of
/// integers so the hot-path check avoids floating point.
const LOAD_FACTOR_NUM: usize = 3;
const LOAD_FACTOR_DENOM: usize = 4;

/// One recorded appearance of a word: the file it came from, the full
/// sentence that contained it, and how many consecutive times that exact
/// `(file, context)` pair was seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub file: String,
    pub context: String,
    pub count: u32,
}

/// A word plus its occurrences, in the order the tokenizer produced them.
#[derive(Debug)]
struct IndexEntry {
    word: String,
    occurrences: Vec<Occurrence>,
}

impl IndexEntry {
    fn new(word: &str) -> Self {
        Self {
            word: word.to_owned(),
            occurrences: Vec::with_capacity(4),
        }
    }

    /// Merge one occurrence. Only the immediately previous occurrence is
    /// considered for merging: the tokenizer emits words sentence by
    /// sentence, so a repeat of the same `(file, context)` pair is always
    /// adjacent and the merge stays O(1).
    fn push_occurrence(&mut self, file: &str, context: &str) {
        if let Some(last) = self.occurrences.last_mut() {
            if last.file == file && last.context == context {
                last.count += 1;
                return;
            }
        }
        self.occurrences.push(Occurrence {
            file: file.to_owned(),
            context: context.to_owned(),
            count: 1,
        });
    }
}

type Bucket = RwLock<Vec<IndexEntry>>;

/// Outcome of the file-level dedup gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRegistration {
    /// First time this path was seen; it is now recorded.
    Fresh,
    /// The path was already registered.
    Duplicate,
}

/// The concurrent inverted index.
///
/// Shared freely across worker threads behind an `Arc`; all methods take
/// `&self`.
pub struct SearchIndex {
    /// Bucket array. Readers (insert/get) hold this shared while they pick
    /// and lock a bucket; the resizer holds it exclusive while swapping.
    table: RwLock<Vec<Bucket>>,
    /// Number of distinct words across all buckets.
    n_items: AtomicUsize,
    /// Paths accepted by the dedup gate, in submission order.
    indexed_files: Mutex<Vec<String>>,
}

/// FNV-1a 64-bit over the word's bytes, reduced by the current capacity.
fn bucket_of(word: &str, cap: usize) -> usize {
    let mut hasher = FnvHasher::default();
    hasher.write(word.as_bytes());
    (hasher.finish() % cap as u64) as usize
}

fn new_buckets(cap: usize) -> Vec<Bucket> {
    (0..cap).map(|_| RwLock::new(Vec::new())).collect()
}

impl SearchIndex {
    /// Create an index with `buckets` initial slots (0 ⇒ [`DEFAULT_BUCKETS`]).
    pub fn new(buckets: usize) -> Self {
        let cap = if buckets == 0 { DEFAULT_BUCKETS } else { buckets };
        Self {
            table: RwLock::new(new_buckets(cap)),
            n_items: AtomicUsize::new(0),
            indexed_files: Mutex::new(Vec::new()),
        }
    }

    /// Record one occurrence of `word` from `file` with sentence `context`.
    ///
    /// If `word` was last seen with the same `(file, context)` pair, the
    /// previous occurrence's count is incremented instead of appending a
    /// duplicate.
    pub fn insert(&self, word: &str, file: &str, context: &str) {
        if self.over_threshold() {
            self.grow();
        }

        let table = self.table.read().unwrap();
        let mut chain = table[bucket_of(word, table.len())].write().unwrap();
        match chain.iter_mut().find(|e| e.word == word) {
            Some(entry) => entry.push_occurrence(file, context),
            None => {
                let mut entry = IndexEntry::new(word);
                entry.push_occurrence(file, context);
                chain.push(entry);
                self.n_items.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Snapshot of the occurrences recorded for `word` (empty if unknown).
    ///
    /// The returned vector is an independent copy; later inserts are not
    /// visible through it.
    pub fn get(&self, word: &str) -> Vec<Occurrence> {
        let table = self.table.read().unwrap();
        let chain = table[bucket_of(word, table.len())].read().unwrap();
        chain
            .iter()
            .find(|e| e.word == word)
            .map(|e| e.occurrences.clone())
            .unwrap_or_default()
    }

    /// Look up `word` and write a listing grouped by file to `out`.
    ///
    /// Files appear in ascending path order; each group reports the total
    /// number of hits in that file and every sentence context.
    pub fn search<W: Write>(&self, word: &str, out: &mut W) -> io::Result<()> {
        let mut occurrences = self.get(word);
        if occurrences.is_empty() {
            return writeln!(out, "No results for '{word}'.");
        }

        occurrences.sort_by(|a, b| a.file.cmp(&b.file).then_with(|| a.context.cmp(&b.context)));

        let mut i = 0;
        while i < occurrences.len() {
            let file = &occurrences[i].file;
            let group_end = occurrences[i..]
                .iter()
                .position(|o| &o.file != file)
                .map_or(occurrences.len(), |off| i + off);
            let hits: u32 = occurrences[i..group_end].iter().map(|o| o.count).sum();

            writeln!(out, "File: {file} ({hits}×)")?;
            writeln!(out, "  Contexts:")?;
            for occurrence in &occurrences[i..group_end] {
                writeln!(out, "    - \"{}\"", occurrence.context)?;
            }
            i = group_end;
        }
        Ok(())
    }

    /// Dedup gate: record `path` if it has not been seen before.
    ///
    /// Membership is by exact string equality. Once a path is registered it
    /// stays registered even if the indexing job later fails.
    pub fn register_file(&self, path: &str) -> FileRegistration {
        let mut files = self.indexed_files.lock().unwrap();
        if files.iter().any(|p| p == path) {
            return FileRegistration::Duplicate;
        }
        files.push(path.to_owned());
        FileRegistration::Fresh
    }

    /// Number of distinct words currently indexed.
    pub fn len(&self) -> usize {
        self.n_items.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current bucket count.
    pub fn capacity(&self) -> usize {
        self.table.read().unwrap().len()
    }

    /// Number of paths accepted by the dedup gate.
    pub fn indexed_file_count(&self) -> usize {
        self.indexed_files.lock().unwrap().len()
    }

    fn over_threshold(&self) -> bool {
        let cap = self.table.read().unwrap().len();
        self.n_items.load(Ordering::Relaxed) * LOAD_FACTOR_DENOM >= cap * LOAD_FACTOR_NUM
    }

    /// Double the bucket array and redistribute every entry.
    ///
    /// Holding the table lock exclusively means no other thread can be
    /// dereferencing the old array, so entries can be moved without touching
    /// the per-bucket locks of the new table. The threshold is re-checked
    /// under the exclusive lock: several inserters may race the same
    /// crossing, and only the first may resize.
    fn grow(&self) {
        let mut table = self.table.write().unwrap();
        let cap = table.len();
        if self.n_items.load(Ordering::Relaxed) * LOAD_FACTOR_DENOM < cap * LOAD_FACTOR_NUM {
            return;
        }

        let new_cap = cap * 2;
        let mut buckets = new_buckets(new_cap);
        for bucket in table.drain(..) {
            for entry in bucket.into_inner().unwrap() {
                let idx = bucket_of(&entry.word, new_cap);
                buckets[idx].get_mut().unwrap().push(entry);
            }
        }
        *table = buckets;
    }
}
