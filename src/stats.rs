//! Run progress counters, shared across all workers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free progress counters for one batch run.
///
/// `total` is fixed before the run starts; the other three only ever grow.
/// Every job attempt bumps `complete` exactly once and exactly one of
/// `success`/`failed`, so `success + failed == complete <= total` holds at
/// every observation point.
#[derive(Debug, Default)]
pub struct Progress {
    total: AtomicU64,
    complete: AtomicU64,
    success: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total: u64,
    pub complete: u64,
    pub success: u64,
    pub failed: u64,
}

impl Progress {
    /// Create counters for a run of `total` jobs.
    pub fn new(total: u64) -> Self {
        Self {
            total: AtomicU64::new(total),
            ..Self::default()
        }
    }

    /// Record one successful job. Returns the new complete count.
    pub fn record_success(&self) -> u64 {
        self.success.fetch_add(1, Ordering::Relaxed);
        self.complete.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record one failed job. Returns the new complete count.
    pub fn record_failure(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.complete.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn complete(&self) -> u64 {
        self.complete.load(Ordering::Relaxed)
    }

    pub fn success(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Whether every job has been accounted for.
    pub fn is_done(&self) -> bool {
        self.complete() >= self.total()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total(),
            complete: self.complete(),
            success: self.success(),
            failed: self.failed(),
        }
    }

    /// Emit the current counters as a progress line.
    pub fn log(&self) {
        let s = self.snapshot();
        tracing::info!(
            complete = s.complete,
            total = s.total,
            success = s.success,
            failed = s.failed,
            "Progress"
        );
    }
}
