//! Integration tests for fast_word_search
//!
//! These tests drive the whole pipeline: files on disk, submission through
//! the dedup gate, background workers tokenizing into the shared index, and
//! the search listing written to a presentation sink.

use std::fs;
use std::io::Cursor;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use fast_word_search::activity::ActivityLog;
use fast_word_search::censor::CensoredSet;
use fast_word_search::config::Config;
use fast_word_search::repl::{self, Engine};
use fast_word_search::{SearchIndex, Submission};
use tempfile::TempDir;

fn test_config() -> Config {
    let mut config = Config::default();
    config.engine.buckets = 16;
    config.queue.capacity = 8;
    config.pool.workers = 2;
    config
}

fn engine_with(censored: CensoredSet) -> Engine {
    Engine::new(&test_config(), Arc::new(censored)).unwrap()
}

/// Submit files, then join the workers so the index is quiescent.
fn index_files(engine: &mut Engine, files: &[&std::path::Path]) {
    for file in files {
        assert_eq!(engine.submit(file), Submission::Accepted);
    }
    engine.shutdown();
}

#[test]
fn insert_then_search_lists_one_group() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "Cats purr.").unwrap();

    let mut engine = engine_with(CensoredSet::empty());
    index_files(&mut engine, &[&file]);

    let mut out = Vec::new();
    engine.search("Cats", &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    let expected = format!(
        "File: {} (1×)\n  Contexts:\n    - \"Cats purr.\"\n",
        file.display()
    );
    assert_eq!(text, expected);
}

#[test]
fn censored_sentences_never_reach_the_index() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("b.txt");
    fs::write(&file, "A bad word. A good word.").unwrap();

    let mut engine = engine_with(CensoredSet::from_words(["bad"]));
    index_files(&mut engine, &[&file]);

    let index = engine.index();
    assert!(index.get("bad").is_empty());

    let good = index.get("good");
    assert_eq!(good.len(), 1);
    assert_eq!(good[0].context, "A good word.");

    let word = index.get("word");
    assert_eq!(word.len(), 1);
    assert_eq!(word[0].context, "A good word.");
}

#[test]
fn consecutive_identical_sentences_merge_interleaved_do_not() {
    let dir = TempDir::new().unwrap();
    let merged = dir.path().join("c.txt");
    fs::write(&merged, "Hi. Hi.").unwrap();
    let split = dir.path().join("d.txt");
    fs::write(&split, "Hi. Bye. Hi.").unwrap();

    let mut engine = engine_with(CensoredSet::empty());
    index_files(&mut engine, &[&merged, &split]);

    let occurrences = engine.index().get("Hi");
    let merged_key = merged.display().to_string();
    let split_key = split.display().to_string();

    let from_merged: Vec<_> = occurrences.iter().filter(|o| o.file == merged_key).collect();
    assert_eq!(from_merged.len(), 1);
    assert_eq!(from_merged[0].count, 2);

    let from_split: Vec<_> = occurrences.iter().filter(|o| o.file == split_key).collect();
    assert_eq!(from_split.len(), 2);
    assert!(from_split.iter().all(|o| o.count == 1));
}

#[test]
fn duplicate_submission_runs_the_tokenizer_once() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("x.txt");
    fs::write(&file, "Once only.").unwrap();

    let mut engine = engine_with(CensoredSet::empty());
    assert_eq!(engine.submit(&file), Submission::Accepted);
    assert_eq!(engine.submit(&file), Submission::Rejected);
    engine.shutdown();

    let occurrences = engine.index().get("Once");
    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].count, 1);
}

#[test]
fn concurrent_inserts_from_many_threads_all_land() {
    const THREADS: usize = 4;
    const WORDS: usize = 250;

    let index = Arc::new(SearchIndex::new(4));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for i in 0..WORDS {
                    index.insert(&format!("thread{t}word{i}"), "f.txt", "A sentence.");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(index.len(), THREADS * WORDS);
    for t in 0..THREADS {
        for i in 0..WORDS {
            assert_eq!(index.get(&format!("thread{t}word{i}")).len(), 1);
        }
    }
}

#[test]
fn clear_is_indistinguishable_from_fresh() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "Cats purr.").unwrap();

    let mut engine = engine_with(CensoredSet::empty());
    index_files(&mut engine, &[&file]);
    assert!(!engine.index().is_empty());

    engine.clear().unwrap();
    assert!(engine.index().is_empty());
    assert!(engine.index().get("Cats").is_empty());

    // The fresh pipeline accepts and indexes the same file again.
    assert_eq!(engine.submit(&file), Submission::Accepted);
    engine.shutdown();
    assert_eq!(engine.index().get("Cats").len(), 1);
}

#[test]
fn scripted_session_writes_activity_log() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "Cats purr.").unwrap();
    let log_path = dir.path().join("activity.log");

    let mut engine = engine_with(CensoredSet::from_words(["bad"]));
    let activity = ActivityLog::open(&log_path).unwrap();
    let interrupted = AtomicBool::new(false);

    let script = format!("_index_ {}\n_search_ bad\n_wat_\n_stop_\n", file.display());
    let mut out = Vec::new();
    let summary = repl::run(
        &mut engine,
        &activity,
        &interrupted,
        Cursor::new(script),
        &mut out,
    )
    .unwrap();

    assert_eq!(summary.indexed, 1);
    assert_eq!(summary.searched, 1);

    let log = fs::read_to_string(&log_path).unwrap();
    let events: Vec<String> = log
        .lines()
        .map(|l| l.split_once("] ").unwrap().1.to_string())
        .collect();
    assert_eq!(
        events,
        vec![
            format!("index {}", file.display()),
            "censored bad".to_string(),
            "unknown _wat_".to_string(),
            "stop".to_string(),
            "EXIT indexed=1 searched=1".to_string(),
        ]
    );
}
