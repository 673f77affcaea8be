//! Integration tests for the batch service.
//!
//! Each test builds a scripted remote client, runs a full
//! open → done → close cycle against temp files, and checks the output file
//! and progress counters.

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use chatbatch::client::{
    ChatRequest, ChatResponse, Client, DownloadRequest, UploadRequest, UploadResponse,
};
use chatbatch::config::BatchConfig;
use chatbatch::error::ClientError;
use chatbatch::job::Job;
use chatbatch::reader;
use chatbatch::service::BatchService;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Scripted remote client: fails chat turns for configured job ids, records
/// which jobs were attempted, and can slow every call down to hold jobs
/// in flight while a checkpoint tick fires.
#[derive(Default)]
struct ScriptedClient {
    fail_ids: HashSet<String>,
    chat_delay: Duration,
    chatted_ids: Mutex<Vec<String>>,
    close_calls: AtomicUsize,
    fail_close: bool,
}

#[async_trait]
impl Client for ScriptedClient {
    async fn upload(&self, req: UploadRequest) -> Result<UploadResponse, ClientError> {
        Ok(UploadResponse {
            conversation_id: req.conversation_id,
            attachment: None,
            part: None,
        })
    }

    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ClientError> {
        if !self.chat_delay.is_zero() {
            tokio::time::sleep(self.chat_delay).await;
        }
        self.chatted_ids.lock().unwrap().push(req.id.clone());
        if self.fail_ids.contains(&req.id) {
            return Err(ClientError::Status {
                op: "chat",
                status: 502,
            });
        }
        Ok(ChatResponse {
            created: 1,
            message_id: format!("msg-{}-{}", req.id, req.pid),
            conversation_id: format!("conv-{}", req.id),
            end_turn: true,
            contents: vec![serde_json::json!(format!("answer to {}", req.message))],
            downloads: vec![],
            spec_downloads: vec![],
        })
    }

    async fn download(&self, _req: DownloadRequest) -> Result<(), ClientError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(ClientError::RequestFailed {
                op: "close",
                reason: "connection reset".to_string(),
            });
        }
        Ok(())
    }
}

/// Write a three-job input file (one single-turn job per line).
fn write_input(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("input.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();
    for id in ["job-1", "job-2", "job-3"] {
        writeln!(
            file,
            r#"{{"id":"{id}","asks":[{{"id":"{id}-ask","content":"hello from {id}"}}],"answers":[]}}"#
        )
        .unwrap();
    }
    path
}

fn config_for(dir: &tempfile::TempDir, input: PathBuf) -> BatchConfig {
    BatchConfig {
        chat_url: "http://unused/chat".to_string(),
        upload_url: "http://unused/upload".to_string(),
        input,
        output: dir.path().join("out.jsonl"),
        concurrency: 2,
        resume: false,
        enable_download: false,
        enable_checkpoint: false,
        ..BatchConfig::default()
    }
}

fn read_output(config: &BatchConfig) -> Vec<Job> {
    std::fs::read_to_string(&config.output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn run_writes_all_jobs_in_order_with_one_failure() {
    timeout(TEST_TIMEOUT, async {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir);
        let config = config_for(&dir, input.clone());

        let client = Arc::new(ScriptedClient {
            fail_ids: HashSet::from(["job-2".to_string()]),
            ..ScriptedClient::default()
        });

        let jobs = reader::load_jobs(&input, false).await.unwrap();
        let service = BatchService::new(config.clone(), Arc::clone(&client) as Arc<dyn Client>, jobs);
        service.open().await.unwrap();
        service.done().await;
        service.close(Duration::from_secs(5)).await.unwrap();

        let progress = service.progress();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.complete, 3);
        assert_eq!(progress.success, 2);
        assert_eq!(progress.failed, 1);

        let written = read_output(&config);
        let ids: Vec<&str> = written.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["job-1", "job-2", "job-3"]);

        assert!(written[0].is_succeeded());
        assert_eq!(written[0].answers.len(), 1);
        assert!(!written[1].is_succeeded());
        assert!(written[1].answers.is_empty());
        assert!(written[2].is_succeeded());

        assert_eq!(client.close_calls.load(Ordering::SeqCst), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn resume_reattempts_only_the_failed_job() {
    timeout(TEST_TIMEOUT, async {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir);

        // First run: job-2 fails.
        let first_config = config_for(&dir, input.clone());
        let first_client = Arc::new(ScriptedClient {
            fail_ids: HashSet::from(["job-2".to_string()]),
            ..ScriptedClient::default()
        });
        let jobs = reader::load_jobs(&input, false).await.unwrap();
        let service = BatchService::new(first_config.clone(), Arc::clone(&first_client) as Arc<dyn Client>, jobs);
        service.open().await.unwrap();
        service.done().await;
        service.close(Duration::from_secs(5)).await.unwrap();

        // Second run in resume mode over the first run's output.
        let second_client = Arc::new(ScriptedClient::default());
        let mut second_config = config_for(&dir, first_config.output.clone());
        second_config.resume = true;
        second_config.output = dir.path().join("out2.jsonl");

        let jobs = reader::load_jobs(&first_config.output, true).await.unwrap();
        let service =
            BatchService::new(second_config.clone(), Arc::clone(&second_client) as Arc<dyn Client>, jobs);
        service.open().await.unwrap();
        service.done().await;
        service.close(Duration::from_secs(5)).await.unwrap();

        // Only job-2 reached the remote service.
        assert_eq!(
            *second_client.chatted_ids.lock().unwrap(),
            vec!["job-2".to_string()]
        );

        let progress = service.progress();
        assert_eq!(progress.success, 3);
        assert_eq!(progress.failed, 0);
        assert_eq!(progress.complete, 3);

        let written = read_output(&second_config);
        assert!(written.iter().all(|j| j.is_succeeded()));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn checkpoint_tick_writes_full_parsable_snapshot() {
    timeout(TEST_TIMEOUT, async {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir);
        let mut config = config_for(&dir, input.clone());
        config.enable_checkpoint = true;
        config.checkpoint_interval = Duration::from_millis(100);
        config.concurrency = 1;

        // Slow every chat down so the first tick observes an unfinished run.
        let client = Arc::new(ScriptedClient {
            chat_delay: Duration::from_millis(250),
            ..ScriptedClient::default()
        });

        let jobs = reader::load_jobs(&input, false).await.unwrap();
        let service = BatchService::new(config.clone(), Arc::clone(&client) as Arc<dyn Client>, jobs);
        service.open().await.unwrap();
        service.done().await;
        service.close(Duration::from_secs(5)).await.unwrap();

        let snapshots: Vec<PathBuf> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.file_name()
                    .map(|name| {
                        let name = name.to_string_lossy();
                        name.starts_with('.') && name.ends_with("-input.jsonl")
                    })
                    .unwrap_or(false)
            })
            .collect();
        assert!(
            !snapshots.is_empty(),
            "expected at least one checkpoint file"
        );

        // Every snapshot holds the entire store, one record per line.
        for snapshot in &snapshots {
            let contents = std::fs::read_to_string(snapshot).unwrap();
            let lines: Vec<&str> = contents.lines().collect();
            assert_eq!(lines.len(), 3);
            for line in lines {
                serde_json::from_str::<Job>(line).unwrap();
            }
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn close_propagates_client_close_failure() {
    timeout(TEST_TIMEOUT, async {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir);
        let config = config_for(&dir, input.clone());

        let client = Arc::new(ScriptedClient {
            fail_close: true,
            ..ScriptedClient::default()
        });

        let jobs = reader::load_jobs(&input, false).await.unwrap();
        let service = BatchService::new(config.clone(), Arc::clone(&client) as Arc<dyn Client>, jobs);
        service.open().await.unwrap();
        service.done().await;

        let result = service.close(Duration::from_secs(5)).await;
        assert!(result.is_err());
        // The authoritative output is not written when close fails.
        assert!(!config.output.exists());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn open_twice_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir);
        let config = config_for(&dir, input.clone());

        let client = Arc::new(ScriptedClient::default());
        let jobs = reader::load_jobs(&input, false).await.unwrap();
        let service = BatchService::new(config, Arc::clone(&client) as Arc<dyn Client>, jobs);

        service.open().await.unwrap();
        assert!(service.open().await.is_err());

        service.done().await;
        service.close(Duration::from_secs(5)).await.unwrap();
        assert!(service.close(Duration::from_secs(5)).await.is_err());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn empty_input_completes_immediately() {
    timeout(TEST_TIMEOUT, async {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.jsonl");
        std::fs::write(&input, "").unwrap();
        let config = config_for(&dir, input.clone());

        let client = Arc::new(ScriptedClient::default());
        let service = BatchService::new(config.clone(), Arc::clone(&client) as Arc<dyn Client>, vec![]);
        service.open().await.unwrap();
        service.done().await;
        service.close(Duration::from_secs(5)).await.unwrap();

        assert_eq!(service.progress().total, 0);
        assert!(config.output.exists());
        assert_eq!(std::fs::read_to_string(&config.output).unwrap(), "");
    })
    .await
    .expect("test timed out");
}
