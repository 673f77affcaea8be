//! Line-oriented input loader.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::ReadError;
use crate::job::{Job, JobErr};

/// Load every job from a JSONL file, one record per line.
///
/// Outside resume mode, input jobs that carry no error are pre-marked with a
/// placeholder so "no error" keeps meaning "already succeeded" for the rest
/// of the run. Blank lines are skipped; a malformed line aborts the load.
pub async fn load_jobs(path: &Path, resume: bool) -> Result<Vec<Job>, ReadError> {
    let file = File::open(path).await.map_err(|e| ReadError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut jobs = Vec::new();
    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let mut job: Job = serde_json::from_str(&line).map_err(|e| ReadError::Parse {
            line: line_no,
            source: e,
        })?;

        if !resume && job.err.is_none() {
            job.err = Some(JobErr::not_ready());
        }

        tracing::debug!(id = %job.id, count = jobs.len() + 1, "Loaded job");
        jobs.push(job);
    }

    tracing::info!(count = jobs.len(), path = %path.display(), "Input loaded");
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    fn write_input(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[tokio::test]
    async fn fresh_run_marks_clean_jobs_not_ready() {
        let file = write_input(&[
            r#"{"id":"a","asks":[{"id":"a-1","content":"hi"}],"answers":[]}"#,
        ]);

        let jobs = load_jobs(file.path(), false).await.unwrap();
        assert_eq!(jobs.len(), 1);
        let err = jobs[0].err.as_ref().unwrap();
        assert_eq!(err.code, crate::job::CODE_NOT_READY);
    }

    #[tokio::test]
    async fn resume_run_leaves_clean_jobs_clean() {
        let file = write_input(&[
            r#"{"id":"a","asks":[],"answers":["done"]}"#,
            r#"{"id":"b","asks":[],"answers":[],"iErr":{"code":501,"message":"boom"}}"#,
        ]);

        let jobs = load_jobs(file.path(), true).await.unwrap();
        assert!(jobs[0].is_succeeded());
        assert!(!jobs[1].is_succeeded());
    }

    #[tokio::test]
    async fn malformed_line_aborts_with_line_number() {
        let file = write_input(&[
            r#"{"id":"a","asks":[],"answers":[]}"#,
            r#"{not json"#,
        ]);

        match load_jobs(file.path(), false).await {
            Err(ReadError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_lines_are_skipped() {
        let file = write_input(&[r#"{"id":"a","asks":[],"answers":[]}"#, "", "   "]);
        let jobs = load_jobs(file.path(), false).await.unwrap();
        assert_eq!(jobs.len(), 1);
    }
}
