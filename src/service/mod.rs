//! The batch execution engine.
//!
//! [`BatchService`] owns the job store for the run: `open` starts the driver
//! (which feeds every job through a bounded worker pool) and the checkpoint
//! loop, `done` resolves once every job is accounted for, and `close` drains
//! the pool, closes the remote client, and writes the authoritative output.

pub mod checkpoint;
pub mod conversation;

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;

use crate::client::Client;
use crate::config::BatchConfig;
use crate::error::{Error, Result, ServiceError};
use crate::job::{Job, JobErr};
use crate::stats::{Progress, ProgressSnapshot};
use crate::store::JobStore;

/// Service lifecycle: open moves Idle to Running, completion (or an external
/// close) moves Running to Draining, and close finishes at Closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    Draining,
    Closed,
}

impl Lifecycle {
    fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Closed => "closed",
        }
    }
}

/// State shared between the service handle and its spawned loops.
struct Shared {
    config: BatchConfig,
    client: Arc<dyn Client>,
    store: Arc<JobStore>,
    progress: Arc<Progress>,
    pool: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
    state: StdMutex<Lifecycle>,
}

impl Shared {
    /// When the last job completes: finalize progress, log once, and signal
    /// shutdown so `done()` observers wake up. Safe to call after any
    /// completion event.
    fn finish_if_done(&self) {
        if !self.progress.is_done() {
            return;
        }
        let transitioned = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if *state == Lifecycle::Running {
                *state = Lifecycle::Draining;
                true
            } else {
                false
            }
        };
        if transitioned {
            self.progress.log();
            tracing::info!("All jobs complete");
        }
        self.shutdown.send_replace(true);
    }
}

/// Batch run service.
pub struct BatchService {
    shared: Arc<Shared>,
    handles: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl BatchService {
    /// Build a service over the loaded jobs. The store is owned by the
    /// service until `close` writes it out.
    pub fn new(config: BatchConfig, client: Arc<dyn Client>, jobs: Vec<Job>) -> Self {
        let total = jobs.len() as u64;
        let concurrency = config.concurrency;
        let (shutdown, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                config,
                client,
                store: Arc::new(JobStore::new(jobs)),
                progress: Arc::new(Progress::new(total)),
                pool: Arc::new(Semaphore::new(concurrency)),
                shutdown,
                state: StdMutex::new(Lifecycle::Idle),
            }),
            handles: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    /// Current progress counters.
    pub fn progress(&self) -> ProgressSnapshot {
        self.shared.progress.snapshot()
    }

    /// Start the driver and the checkpoint loop.
    pub async fn open(&self) -> Result<()> {
        {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            if *state != Lifecycle::Idle {
                return Err(ServiceError::InvalidState {
                    state: state.name(),
                    action: "open",
                }
                .into());
            }
            *state = Lifecycle::Running;
        }

        tracing::info!(
            total = self.shared.store.len(),
            concurrency = self.shared.config.concurrency,
            resume = self.shared.config.resume,
            "Batch run started"
        );

        let mut handles = vec![tokio::spawn(drive(Arc::clone(&self.shared)))];
        if self.shared.config.enable_checkpoint {
            handles.push(tokio::spawn(checkpoint::run(
                Arc::clone(&self.shared.store),
                Arc::clone(&self.shared.progress),
                self.shared.config.input.clone(),
                self.shared.config.checkpoint_interval,
                self.shared.shutdown.subscribe(),
            )));
        }
        *self.handles.lock().await = handles;
        Ok(())
    }

    /// Resolve once every job has completed (or shutdown was requested).
    pub async fn done(&self) {
        let mut rx = self.shared.shutdown.subscribe();
        // The sender lives in Shared, so wait_for can only fail if the
        // service itself is gone; treat that as done.
        let _ = rx.wait_for(|done| *done).await;
    }

    /// Drain the pool (bounded by `grace`), close the remote client, and
    /// write every job to the output path. Close and write failures are
    /// fatal and returned.
    pub async fn close(&self, grace: Duration) -> Result<()> {
        {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            match *state {
                Lifecycle::Idle | Lifecycle::Closed => {
                    return Err(ServiceError::InvalidState {
                        state: state.name(),
                        action: "close",
                    }
                    .into());
                }
                Lifecycle::Running | Lifecycle::Draining => *state = Lifecycle::Draining,
            }
        }
        self.shared.shutdown.send_replace(true);

        // Driver and checkpoint loops observe the signal and stop.
        for handle in self.handles.lock().await.drain(..) {
            let _ = handle.await;
        }

        // In-flight jobs hold pool permits; reclaiming the full capacity
        // means the pool has drained.
        let capacity = self.shared.config.concurrency as u32;
        match tokio::time::timeout(grace, self.shared.pool.acquire_many(capacity)).await {
            Ok(Ok(permits)) => drop(permits),
            Ok(Err(_)) => {}
            Err(_) => {
                tracing::warn!(grace = ?grace, "Grace period elapsed with jobs still in flight")
            }
        }
        self.shared.pool.close();

        self.shared.client.close().await.map_err(Error::Client)?;

        let jobs = self.shared.store.snapshot().await;
        checkpoint::write_jobs(&self.shared.config.output, &jobs).await?;
        tracing::info!(
            path = %self.shared.config.output.display(),
            jobs = jobs.len(),
            "Output written"
        );

        *self.shared.state.lock().unwrap_or_else(|e| e.into_inner()) = Lifecycle::Closed;
        Ok(())
    }
}

/// Submit every job to the worker pool in input order.
///
/// Submission blocks only on pool capacity; network waits happen inside the
/// spawned attempt. Jobs the pool rejects are marked failed without an
/// attempt and still count toward completion.
async fn drive(shared: Arc<Shared>) {
    let mut shutdown = shared.shutdown.subscribe();

    for index in 0..shared.store.len() {
        if *shutdown.borrow() {
            tracing::info!("Shutdown requested, submitting no further jobs");
            break;
        }

        if shared.config.resume && shared.store.is_succeeded(index).await {
            shared.progress.record_success();
            shared.finish_if_done();
            continue;
        }

        let permit = tokio::select! {
            acquired = Arc::clone(&shared.pool).acquire_owned() => match acquired {
                Ok(permit) => permit,
                Err(_) => {
                    let id = shared.store.job(index).await.id;
                    let reason = ServiceError::SubmitFailed {
                        id: id.clone(),
                        reason: "worker pool is closed".to_string(),
                    };
                    tracing::error!(id = %id, error = %reason, "Submit failed");
                    shared
                        .store
                        .fail(index, JobErr::attempt_failed(reason.to_string()))
                        .await;
                    shared.progress.record_failure();
                    shared.finish_if_done();
                    continue;
                }
            },
            _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => {
                tracing::info!("Shutdown requested, submitting no further jobs");
                break;
            }
        };

        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            let _permit = permit;
            attempt(&shared, index).await;
        });
    }

    // Covers the empty-input run, where no completion event ever fires.
    shared.finish_if_done();
}

/// Run one job to its terminal state and record the outcome.
async fn attempt(shared: &Shared, index: usize) {
    let job = shared.store.job(index).await;
    let id = job.id.clone();

    match conversation::run_job(shared.client.as_ref(), &shared.config, &job).await {
        Ok(answers) => {
            shared.store.commit(index, answers).await;
            shared.progress.record_success();
            tracing::info!(id = %id, "Job succeeded");
        }
        Err(e) => {
            tracing::error!(id = %id, error = %e, "Job failed");
            shared
                .store
                .fail(index, JobErr::attempt_failed(e.to_string()))
                .await;
            shared.progress.record_failure();
        }
    }
    shared.progress.log();
    shared.finish_if_done();
}
