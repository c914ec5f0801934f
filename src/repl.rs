//! Interactive command loop and the pipeline orchestrator behind it.
//!
//! The [`Engine`] owns the index, the job queue, and the worker pool as one
//! unit: they are created together and torn down together, and `_clear_`
//! replaces all three only after every worker has been joined. Signal
//! handlers set an atomic flag which the loop polls between commands;
//! shutdown itself always runs on the calling thread.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::activity::{ActivityLog, Event};
use crate::censor::CensoredSet;
use crate::config::Config;
use crate::index::SearchIndex;
use crate::pool::{JobQueue, Submission, WorkerPool};
use crate::utils::plural;

/// The index pipeline: index, queue, and pool with one lifecycle.
///
/// Field order encodes drop order: the pool joins its workers first, then
/// the queue goes, then the index.
pub struct Engine {
    pool: WorkerPool,
    queue: Arc<JobQueue>,
    index: Arc<SearchIndex>,
    censored: Arc<CensoredSet>,
    buckets: usize,
    queue_capacity: usize,
    block_warn: Duration,
    workers: usize,
}

impl Engine {
    pub fn new(config: &Config, censored: Arc<CensoredSet>) -> Result<Self> {
        let buckets = config.engine.buckets;
        let queue_capacity = config.queue.capacity;
        let block_warn = Duration::from_secs_f64(config.queue.block_warn_secs);
        let workers = config.pool.workers;

        let (index, queue, pool) = Self::build(buckets, queue_capacity, block_warn, workers)?;
        Ok(Self {
            index,
            queue,
            pool,
            censored,
            buckets,
            queue_capacity,
            block_warn,
            workers,
        })
    }

    fn build(
        buckets: usize,
        queue_capacity: usize,
        block_warn: Duration,
        workers: usize,
    ) -> Result<(Arc<SearchIndex>, Arc<JobQueue>, WorkerPool)> {
        let index = Arc::new(SearchIndex::new(buckets));
        let queue = Arc::new(JobQueue::new(queue_capacity, block_warn));
        let pool = WorkerPool::start(workers, Arc::clone(&queue))?;
        Ok((index, queue, pool))
    }

    /// Submit one file for background indexing.
    pub fn submit(&self, path: &Path) -> Submission {
        self.pool.submit(path, &self.index, &self.censored)
    }

    /// Write the search listing for `term` to `out`.
    pub fn search<W: Write>(&self, term: &str, out: &mut W) -> std::io::Result<()> {
        self.index.search(term, out)
    }

    pub fn censored(&self) -> &CensoredSet {
        &self.censored
    }

    pub fn index(&self) -> &Arc<SearchIndex> {
        &self.index
    }

    /// Tear down the pipeline and build a fresh one.
    ///
    /// Teardown order is load-bearing: close the queue and join every
    /// worker first, so nothing references the old index when it is
    /// dropped by the reassignment below.
    pub fn clear(&mut self) -> Result<()> {
        self.pool.shutdown_and_join();
        let (index, queue, pool) =
            Self::build(self.buckets, self.queue_capacity, self.block_warn, self.workers)?;
        self.index = index;
        self.queue = queue;
        self.pool = pool;
        Ok(())
    }

    /// Close the queue and join every worker. The index stays readable.
    pub fn shutdown(&mut self) {
        self.pool.shutdown_and_join();
    }

    /// Jobs waiting in the queue right now.
    pub fn queued_jobs(&self) -> usize {
        self.queue.len()
    }
}

/// One parsed input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Index(&'a str),
    Search(&'a str),
    Clear,
    Stop,
    Unknown(&'a str),
}

/// Parse a whitespace-trimmed input line.
pub fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if let Some(path) = line.strip_prefix("_index_ ") {
        let path = path.trim();
        if !path.is_empty() {
            return Command::Index(path);
        }
    } else if let Some(term) = line.strip_prefix("_search_ ") {
        let term = term.trim();
        if !term.is_empty() {
            return Command::Search(term);
        }
    } else if line == "_clear_" {
        return Command::Clear;
    } else if line == "_stop_" {
        return Command::Stop;
    }
    Command::Unknown(line)
}

/// Counters reported in the exit summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplSummary {
    /// Index submissions accepted by the dedup gate.
    pub indexed: usize,
    /// Searches served, censored lookups included.
    pub searched: usize,
}

/// Drive the command loop until `_stop_`, EOF, or a pending signal.
///
/// Presentation goes to `out`; diagnostics go to `tracing`; every command
/// is recorded in the activity log. Returns the exit counters.
pub fn run<R: BufRead, W: Write>(
    engine: &mut Engine,
    activity: &ActivityLog,
    interrupted: &AtomicBool,
    input: R,
    out: &mut W,
) -> Result<ReplSummary> {
    let mut summary = ReplSummary::default();

    writeln!(out, "Commands: _index_ <file> | _search_ <word> | _clear_ | _stop_")?;
    write!(out, "> ")?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        if interrupted.load(Ordering::Relaxed) {
            writeln!(out, "Interrupt received. Shutting down...")?;
            break;
        }

        match parse_command(&line) {
            Command::Index(path) => {
                activity.record(Event::Index(path));
                match engine.submit(Path::new(path)) {
                    Submission::Accepted => {
                        summary.indexed += 1;
                        writeln!(out, "Queued indexing for file: {path}")?;
                    }
                    Submission::Rejected => {
                        writeln!(out, "File already queued or indexed: {path}")?;
                    }
                }
            }
            Command::Search(term) => {
                summary.searched += 1;
                if engine.censored().contains(term) {
                    activity.record(Event::Censored(term));
                    writeln!(out, "Search term '{term}' is censored.")?;
                } else {
                    activity.record(Event::Search(term));
                    engine.search(term, out)?;
                }
            }
            Command::Clear => {
                activity.record(Event::Clear);
                engine.clear()?;
                writeln!(out, "Index cleared. All data dropped.")?;
            }
            Command::Stop => {
                activity.record(Event::Stop);
                writeln!(out, "Stop command received. Shutting down...")?;
                break;
            }
            Command::Unknown(line) => {
                activity.record(Event::Unknown(line));
                writeln!(out, "Unknown command: {line}")?;
                writeln!(out, "Try: _index_ <file>, _search_ <word>, _clear_, or _stop_")?;
            }
        }

        write!(out, "> ")?;
        out.flush()?;
    }

    activity.record(Event::Exit {
        indexed: summary.indexed,
        searched: summary.searched,
    });
    engine.shutdown();
    writeln!(
        out,
        "Stopped. Indexed {} file{}, served {} search{}.",
        summary.indexed,
        plural(summary.indexed),
        summary.searched,
        if summary.searched == 1 { "" } else { "es" },
    )?;

    Ok(summary)
}
