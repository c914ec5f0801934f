//! Append-only activity log.
//!
//! One event per line, `[<unix_time>] <event> <arg?>`, written to
//! `activity.log` (configurable). Logging failures are diagnosed once and
//! never interrupt the command loop.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::warn;

/// Everything the command loop records.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    CensoredLoaded(usize),
    Index(&'a str),
    Search(&'a str),
    Censored(&'a str),
    Clear,
    Stop,
    Unknown(&'a str),
    Exit { indexed: usize, searched: usize },
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::CensoredLoaded(n) => write!(f, "loaded {n} censored words"),
            Event::Index(path) => write!(f, "index {path}"),
            Event::Search(term) => write!(f, "search {term}"),
            Event::Censored(term) => write!(f, "censored {term}"),
            Event::Clear => write!(f, "clear"),
            Event::Stop => write!(f, "stop"),
            Event::Unknown(line) => write!(f, "unknown {line}"),
            Event::Exit { indexed, searched } => {
                write!(f, "EXIT indexed={indexed} searched={searched}")
            }
        }
    }
}

/// Handle to the append-only log file.
pub struct ActivityLog {
    file: Mutex<Option<File>>,
    write_failed: AtomicBool,
}

impl ActivityLog {
    /// Open (or create) the log at `path` in append mode.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open activity log {}", path.display()))?;
        Ok(Self {
            file: Mutex::new(Some(file)),
            write_failed: AtomicBool::new(false),
        })
    }

    /// A log that swallows every event, for when opening the file failed.
    pub fn disabled() -> Self {
        Self {
            file: Mutex::new(None),
            write_failed: AtomicBool::new(false),
        }
    }

    /// Append one timestamped event.
    pub fn record(&self, event: Event<'_>) {
        let timestamp = chrono::Utc::now().timestamp();
        let mut file = self.file.lock().unwrap();
        let Some(file) = file.as_mut() else { return };
        if let Err(e) = writeln!(file, "[{timestamp}] {event}") {
            if !self.write_failed.swap(true, Ordering::Relaxed) {
                warn!(error = %e, "failed to append to activity log");
            }
        }
    }
}
