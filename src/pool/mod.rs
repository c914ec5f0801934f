pub mod queue;
pub mod worker;

pub use queue::{JobQueue, DEFAULT_QUEUE_CAPACITY};
pub use worker::{Submission, WorkerPool};

use std::path::PathBuf;
use std::sync::Arc;

use crate::censor::CensoredSet;
use crate::index::SearchIndex;

/// One unit of work: tokenize this file into the shared index.
///
/// The job owns its path; the index and censored-set handles are shared and
/// outlive every job.
pub struct Job {
    pub file: PathBuf,
    pub index: Arc<SearchIndex>,
    pub censored: Arc<CensoredSet>,
}
