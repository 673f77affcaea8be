//! In-memory job store shared between workers and the checkpoint loop.

use futures::future::join_all;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::job::{Job, JobErr};

/// Fixed-size store of job slots, created once at load time.
///
/// Each slot has its own lock: exactly one worker writes a given job, while
/// the checkpoint loop reads every slot concurrently. Snapshots therefore
/// never observe a job mid-mutation.
pub struct JobStore {
    slots: Vec<RwLock<Job>>,
}

impl JobStore {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self {
            slots: jobs.into_iter().map(RwLock::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Clone the job in `index` for an attempt.
    pub async fn job(&self, index: usize) -> Job {
        self.slots[index].read().await.clone()
    }

    /// Whether the job in `index` is already marked successful.
    pub async fn is_succeeded(&self, index: usize) -> bool {
        self.slots[index].read().await.is_succeeded()
    }

    /// Commit a successful attempt: replace the answers, clear the error.
    pub async fn commit(&self, index: usize, answers: Vec<Value>) {
        let mut job = self.slots[index].write().await;
        job.answers = answers;
        job.err = None;
    }

    /// Record a failed attempt. Answers are left exactly as they were.
    pub async fn fail(&self, index: usize, err: JobErr) {
        self.slots[index].write().await.err = Some(err);
    }

    /// Copy of every job in input order.
    pub async fn snapshot(&self) -> Vec<Job> {
        join_all(
            self.slots
                .iter()
                .map(|slot| async move { slot.read().await.clone() }),
        )
        .await
    }
}
