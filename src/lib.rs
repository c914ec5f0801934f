//! fast_word_search: a multi-threaded in-memory word search engine.
//!
//! Files are tokenized into sentences by a pool of worker threads fed from
//! a bounded job queue; every retained word occurrence lands in a
//! concurrent striped hash index along with the file path and the sentence
//! that produced it. Sentences containing censored words are skipped at
//! index time. An interactive command loop drives indexing, search, clear,
//! and stop.

pub mod activity;
pub mod censor;
pub mod config;
pub mod index;
pub mod pool;
pub mod repl;
pub mod telemetry;
pub mod tokenizer;
pub mod utils;

pub use activity::{ActivityLog, Event};
pub use censor::CensoredSet;
pub use config::Config;
pub use index::{FileRegistration, Occurrence, SearchIndex};
pub use pool::{Job, JobQueue, Submission, WorkerPool};
pub use repl::{Engine, ReplSummary};
