//! Run counters shared by the sweep workers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::sweep::RunStatus;

/// Completed / skipped / failed counts, updated from the blocking pool
#[derive(Debug)]
pub struct RunCounters {
    completed: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
    total: usize,
    started: Instant,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

impl Tally {
    pub fn finished(&self) -> usize {
        self.completed + self.skipped + self.failed
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.finished())
    }
}

impl RunCounters {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            total,
            started: Instant::now(),
        }
    }

    pub fn record(&self, status: &RunStatus) {
        let counter = match status {
            RunStatus::Completed { .. } => &self.completed,
            RunStatus::Skipped { .. } => &self.skipped,
            RunStatus::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Tally {
        Tally {
            completed: self.completed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            total: self.total,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Remaining time at the average pace so far
    pub fn eta(&self) -> Option<Duration> {
        estimate_remaining(self.elapsed(), &self.snapshot())
    }
}

/// `elapsed / finished * remaining`; `None` before the first run finishes
pub fn estimate_remaining(elapsed: Duration, tally: &Tally) -> Option<Duration> {
    let finished = u32::try_from(tally.finished()).ok().filter(|n| *n > 0)?;
    let remaining = u32::try_from(tally.remaining()).unwrap_or(u32::MAX);
    Some(elapsed / finished * remaining)
}

/// `{m}m{s}s`
pub fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs();
    format!("{}m{}s", secs / 60, secs % 60)
}
