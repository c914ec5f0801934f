//! Fixed worker pool draining the job queue.
//!
//! Workers block in [`JobQueue::pop`] and run the tokenizer on each job.
//! Submission goes through the index's dedup gate first, so the same path
//! is never queued twice. Shutdown is cooperative: closing the queue lets
//! every worker drain the remaining jobs and exit, after which they are
//! joined.

use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use tracing::{error, info};

use super::{Job, JobQueue};
use crate::censor::CensoredSet;
use crate::index::{FileRegistration, SearchIndex};
use crate::tokenizer;

/// Outcome of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The job was pushed onto the queue.
    Accepted,
    /// The path was already queued or indexed.
    Rejected,
}

/// A fixed set of indexing threads consuming from one shared queue.
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
    queue: Arc<JobQueue>,
}

fn worker_loop(queue: Arc<JobQueue>) {
    while let Some(job) = queue.pop() {
        match tokenizer::tokenize_file(&job.file, &job.index, &job.censored) {
            Ok(()) => info!(file = %job.file.display(), "worker finished indexing"),
            Err(e) => error!(file = %job.file.display(), error = %e, "indexing failed"),
        }
    }
}

impl WorkerPool {
    /// Spawn `n` workers pulling from `queue` (0 ⇒ one per online CPU).
    ///
    /// Failing to spawn a thread is fatal for the pool and surfaces as an
    /// error; threads spawned so far are left running on the shared queue
    /// and will be joined by `Drop`.
    pub fn start(n: usize, queue: Arc<JobQueue>) -> Result<Self> {
        let n = if n == 0 {
            thread::available_parallelism().map_or(1, usize::from)
        } else {
            n
        };

        let mut workers = Vec::with_capacity(n);
        for i in 0..n {
            let queue = Arc::clone(&queue);
            let handle = thread::Builder::new()
                .name(format!("indexer-{i}"))
                .spawn(move || worker_loop(queue))
                .with_context(|| format!("failed to spawn worker thread {i}"))?;
            workers.push(handle);
        }
        info!(workers = n, "worker pool started");
        Ok(Self { workers, queue })
    }

    /// Submit one file for indexing.
    ///
    /// Consults the dedup gate before queueing; a duplicate path is rejected
    /// without touching the queue. Blocks if the queue is full.
    pub fn submit(
        &self,
        path: &Path,
        index: &Arc<SearchIndex>,
        censored: &Arc<CensoredSet>,
    ) -> Submission {
        let key = path.to_string_lossy();
        if index.register_file(&key) == FileRegistration::Duplicate {
            info!(file = %path.display(), "file already queued or indexed");
            return Submission::Rejected;
        }

        self.queue.push(Job {
            file: path.to_path_buf(),
            index: Arc::clone(index),
            censored: Arc::clone(censored),
        });
        Submission::Accepted
    }

    /// Number of worker threads (0 once joined).
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Close the queue and join every worker. Idempotent.
    ///
    /// This is the quiescence point: after it returns, no worker holds a
    /// reference to the index or the queue, so both can be dropped.
    pub fn shutdown_and_join(&mut self) {
        self.queue.shutdown();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
