//! Logging decorator for the remote capability.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::client::types::{
    ChatRequest, ChatResponse, DownloadRequest, UploadRequest, UploadResponse,
};
use crate::client::Client;
use crate::error::ClientError;

/// Wraps another client and logs every call with its outcome and latency.
pub struct LoggingClient {
    inner: Arc<dyn Client>,
}

impl LoggingClient {
    pub fn new(inner: Arc<dyn Client>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Client for LoggingClient {
    async fn upload(&self, req: UploadRequest) -> Result<UploadResponse, ClientError> {
        let start = Instant::now();
        let id = req.id.clone();
        let pid = req.pid.clone();
        let path = req.upload_path.display().to_string();

        let result = self.inner.upload(req).await;
        match &result {
            Ok(_) => tracing::info!(
                id = %id,
                pid = %pid,
                path = %path,
                took = ?start.elapsed(),
                "Upload"
            ),
            Err(e) => tracing::error!(
                id = %id,
                pid = %pid,
                path = %path,
                took = ?start.elapsed(),
                error = %e,
                "Upload failed"
            ),
        }
        result
    }

    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ClientError> {
        let start = Instant::now();
        let id = req.id.clone();
        let pid = req.pid.clone();
        let model = req.model.clone();
        let conversation_id = req.conversation_id.clone().unwrap_or_default();

        let result = self.inner.chat(req).await;
        match &result {
            Ok(resp) => tracing::info!(
                id = %id,
                pid = %pid,
                model = %model,
                conversation_id = %conversation_id,
                end_turn = resp.end_turn,
                downloads = resp.downloads.len(),
                took = ?start.elapsed(),
                "Chat"
            ),
            Err(e) => tracing::error!(
                id = %id,
                pid = %pid,
                model = %model,
                conversation_id = %conversation_id,
                took = ?start.elapsed(),
                error = %e,
                "Chat failed"
            ),
        }
        result
    }

    async fn download(&self, req: DownloadRequest) -> Result<(), ClientError> {
        let start = Instant::now();
        let id = req.id.clone();
        let pid = req.pid.clone();
        let local = req.local_dir.join(&req.local_file_name);

        let result = self.inner.download(req).await;
        match &result {
            Ok(()) => tracing::info!(
                id = %id,
                pid = %pid,
                local = %local.display(),
                took = ?start.elapsed(),
                "Download"
            ),
            Err(e) => tracing::error!(
                id = %id,
                pid = %pid,
                local = %local.display(),
                took = ?start.elapsed(),
                error = %e,
                "Download failed"
            ),
        }
        result
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.inner.close().await
    }
}
