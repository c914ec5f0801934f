//! Bounded blocking job queue feeding the worker pool.
//!
//! A circular buffer with `head`/`tail` indices under one mutex and two
//! condition variables, `not_empty` for consumers and `not_full` for the
//! producer. One slot is kept unused so a full queue is distinguishable from
//! an empty one. Shutdown closes the queue and wakes every waiter; consumers
//! drain the remaining jobs before observing the close.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use super::Job;

/// Job slots when no capacity is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// How long a producer may wait on a full queue before a back-pressure
/// warning is logged. One warning per elapsed interval, then keep waiting.
pub const DEFAULT_BLOCK_WARN: Duration = Duration::from_secs(1);

struct Ring {
    buf: Vec<Option<Job>>,
    head: usize,
    tail: usize,
    closed: bool,
}

impl Ring {
    fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    fn is_full(&self) -> bool {
        (self.tail + 1) % self.buf.len() == self.head
    }

    fn len(&self) -> usize {
        (self.tail + self.buf.len() - self.head) % self.buf.len()
    }
}

/// Single-producer/many-consumer FIFO of fixed capacity.
pub struct JobQueue {
    ring: Mutex<Ring>,
    not_empty: Condvar,
    not_full: Condvar,
    block_warn: Duration,
}

impl JobQueue {
    /// Create a queue with `capacity` slots (0 ⇒ [`DEFAULT_QUEUE_CAPACITY`]).
    ///
    /// One slot stays reserved, so the smallest useful capacity is 2.
    pub fn new(capacity: usize, block_warn: Duration) -> Self {
        let capacity = match capacity {
            0 => DEFAULT_QUEUE_CAPACITY,
            1 => 2,
            n => n,
        };
        let mut buf = Vec::with_capacity(capacity);
        buf.resize_with(capacity, || None);
        Self {
            ring: Mutex::new(Ring {
                buf,
                head: 0,
                tail: 0,
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            block_warn,
        }
    }

    /// Enqueue a job, blocking while the queue is full.
    ///
    /// Pushing after [`shutdown`](Self::shutdown) is a caller-contract
    /// violation; the job is dropped without touching the buffer.
    pub fn push(&self, job: Job) {
        let mut ring = self.ring.lock().unwrap();
        while ring.is_full() && !ring.closed {
            let (guard, timeout) = self.not_full.wait_timeout(ring, self.block_warn).unwrap();
            ring = guard;
            if timeout.timed_out() && ring.is_full() && !ring.closed {
                // The queue mutex is released while the warning is written;
                // the diagnostic sink is never entered under a queue lock.
                drop(ring);
                tracing::warn!(
                    waited_secs = self.block_warn.as_secs_f64(),
                    "job queue push blocked on a full queue"
                );
                ring = self.ring.lock().unwrap();
            }
        }
        if ring.closed {
            drop(ring);
            tracing::error!(
                file = %job.file.display(),
                "job submitted after queue shutdown, dropping"
            );
            return;
        }

        let cap = ring.buf.len();
        let tail = ring.tail;
        ring.buf[tail] = Some(job);
        ring.tail = (tail + 1) % cap;
        drop(ring);
        self.not_empty.notify_one();
    }

    /// Dequeue the next job, blocking while the queue is empty and open.
    ///
    /// Returns `None` exactly when the queue is empty and shut down.
    pub fn pop(&self) -> Option<Job> {
        let mut ring = self.ring.lock().unwrap();
        while ring.is_empty() && !ring.closed {
            ring = self.not_empty.wait(ring).unwrap();
        }
        if ring.is_empty() {
            return None;
        }

        let cap = ring.buf.len();
        let head = ring.head;
        let job = ring.buf[head].take();
        ring.head = (head + 1) % cap;
        drop(ring);
        self.not_full.notify_one();
        job
    }

    /// Close the queue and wake every waiter on both conditions. Idempotent.
    pub fn shutdown(&self) {
        let mut ring = self.ring.lock().unwrap();
        ring.closed = true;
        drop(ring);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Jobs currently queued. Diagnostic snapshot only.
    pub fn len(&self) -> usize {
        self.ring.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::censor::CensoredSet;
    use crate::index::SearchIndex;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::thread;

    fn job(name: &str, index: &Arc<SearchIndex>, censored: &Arc<CensoredSet>) -> Job {
        Job {
            file: PathBuf::from(name),
            index: Arc::clone(index),
            censored: Arc::clone(censored),
        }
    }

    fn fixtures() -> (Arc<SearchIndex>, Arc<CensoredSet>) {
        (
            Arc::new(SearchIndex::new(4)),
            Arc::new(CensoredSet::empty()),
        )
    }

    #[test]
    fn fifo_order_for_single_producer() {
        let (index, censored) = fixtures();
        let queue = JobQueue::new(8, DEFAULT_BLOCK_WARN);
        for name in ["a", "b", "c"] {
            queue.push(job(name, &index, &censored));
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().unwrap().file, PathBuf::from("a"));
        assert_eq!(queue.pop().unwrap().file, PathBuf::from("b"));
        assert_eq!(queue.pop().unwrap().file, PathBuf::from("c"));
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_returns_none_only_after_shutdown() {
        let (index, censored) = fixtures();
        let queue = JobQueue::new(4, DEFAULT_BLOCK_WARN);
        queue.push(job("a", &index, &censored));
        queue.shutdown();

        // Remaining jobs drain before the close is observed.
        assert!(queue.pop().is_some());
        assert!(queue.pop().is_none());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn shutdown_wakes_every_blocked_consumer() {
        let queue = Arc::new(JobQueue::new(4, DEFAULT_BLOCK_WARN));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.pop().is_none())
            })
            .collect();

        // Give the consumers a moment to block on not_empty.
        thread::sleep(Duration::from_millis(50));
        queue.shutdown();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn capacity_two_serialises_producer_and_consumer() {
        const JOBS: usize = 100;
        let (index, censored) = fixtures();
        let queue = Arc::new(JobQueue::new(2, DEFAULT_BLOCK_WARN));

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut popped = 0usize;
                while queue.pop().is_some() {
                    popped += 1;
                }
                popped
            })
        };

        for i in 0..JOBS {
            queue.push(job(&format!("f{i}"), &index, &censored));
        }
        queue.shutdown();
        assert_eq!(consumer.join().unwrap(), JOBS);
    }

    #[test]
    fn no_job_is_lost_across_shutdown() {
        const JOBS: usize = 64;
        let (index, censored) = fixtures();
        let queue = Arc::new(JobQueue::new(16, DEFAULT_BLOCK_WARN));

        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut popped = 0usize;
                    while queue.pop().is_some() {
                        popped += 1;
                    }
                    popped
                })
            })
            .collect();

        for i in 0..JOBS {
            queue.push(job(&format!("f{i}"), &index, &censored));
        }
        queue.shutdown();

        let popped: usize = consumers.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(popped + queue.len(), JOBS);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn push_after_shutdown_does_not_corrupt() {
        let (index, censored) = fixtures();
        let queue = JobQueue::new(4, DEFAULT_BLOCK_WARN);
        queue.shutdown();
        // Contract violation: the job is dropped, the queue stays empty.
        queue.push(job("late", &index, &censored));
        assert!(queue.pop().is_none());
    }
}
