//! Periodic durable snapshots of the job store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::error::ServiceError;
use crate::job::Job;
use crate::stats::Progress;
use crate::store::JobStore;

/// Recovery file name for a tick at `now`: hidden, timestamped, derived from
/// the input base name, placed beside the input file. One new file per tick.
pub fn snapshot_path(input: &Path, now: DateTime<Local>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!(
        ".{}-{}-{}.jsonl",
        now.format("%Y%m%d"),
        now.format("%H%M"),
        stem
    );
    match input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
        _ => PathBuf::from(name),
    }
}

/// Write every job as one JSON line, then flush and fsync before returning.
pub async fn write_jobs(path: &Path, jobs: &[Job]) -> Result<(), ServiceError> {
    let file = File::create(path)
        .await
        .map_err(|e| ServiceError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    let mut writer = BufWriter::new(file);

    for job in jobs {
        let line = serde_json::to_string(job).map_err(|e| ServiceError::WriteFailed {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ServiceError::WriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|e| ServiceError::WriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    writer
        .flush()
        .await
        .map_err(|e| ServiceError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    writer
        .get_ref()
        .sync_all()
        .await
        .map_err(|e| ServiceError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(())
}

/// Checkpoint loop: snapshot the store every `interval` until the run
/// completes or shutdown is signalled. Write failures are logged and the
/// next tick tries again; they never end the run.
pub async fn run(
    store: Arc<JobStore>,
    progress: Arc<Progress>,
    input: PathBuf,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval() fires immediately; consume that tick so the first snapshot
    // lands a full interval into the run.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if progress.is_done() {
                    break;
                }
                let path = snapshot_path(&input, Local::now());
                let jobs = store.snapshot().await;
                match write_jobs(&path, &jobs).await {
                    Ok(()) => tracing::info!(
                        path = %path.display(),
                        jobs = jobs.len(),
                        "Checkpoint written"
                    ),
                    Err(e) => tracing::warn!(error = %e, "Checkpoint write failed"),
                }
            }
            _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => break,
        }
    }
    tracing::debug!("Checkpoint loop stopped");
}
