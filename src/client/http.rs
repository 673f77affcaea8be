//! Reqwest-backed transport for the chat service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use secrecy::{ExposeSecret, SecretString};

use crate::client::types::{
    ChatRequest, ChatResponse, DownloadRequest, UploadKind, UploadRequest, UploadResponse,
};
use crate::client::Client;
use crate::error::ClientError;

/// Uploads move whole files; give them some room.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Chat turns can take minutes on long generations.
const CHAT_TIMEOUT: Duration = Duration::from_secs(8 * 60);

/// Downloads are served from storage and should be quick.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub chat_url: String,
    pub upload_url: String,
    pub access_token: SecretString,
}

/// Concrete HTTP implementation of the remote capability.
pub struct HttpClient {
    config: HttpClientConfig,
    http: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn bearer(&self) -> &str {
        self.config.access_token.expose_secret()
    }
}

#[async_trait]
impl Client for HttpClient {
    async fn upload(&self, req: UploadRequest) -> Result<UploadResponse, ClientError> {
        let file_name = req
            .upload_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = tokio::fs::read(&req.upload_path).await?;

        let kind = match req.kind {
            UploadKind::File => "my_files",
            UploadKind::Multimodal => "multimodal",
        };
        let mut form = multipart::Form::new()
            .text("type", kind)
            .part("file", multipart::Part::bytes(bytes).file_name(file_name));
        if let Some(conversation_id) = &req.conversation_id {
            form = form.text("conversation_id", conversation_id.clone());
        }

        let response = self
            .http
            .post(&self.config.upload_url)
            .bearer_auth(self.bearer())
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed {
                op: "upload",
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                op: "upload",
                status: response.status().as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::RequestFailed {
                op: "upload",
                reason: e.to_string(),
            })?;
        serde_json::from_slice(&body).map_err(|e| ClientError::InvalidResponse {
            op: "upload",
            source: e,
        })
    }

    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ClientError> {
        let response = self
            .http
            .post(&self.config.chat_url)
            .bearer_auth(self.bearer())
            .json(&req)
            .timeout(CHAT_TIMEOUT)
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed {
                op: "chat",
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                op: "chat",
                status: response.status().as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::RequestFailed {
                op: "chat",
                reason: e.to_string(),
            })?;
        serde_json::from_slice(&body).map_err(|e| ClientError::InvalidResponse {
            op: "chat",
            source: e,
        })
    }

    async fn download(&self, req: DownloadRequest) -> Result<(), ClientError> {
        let response = self
            .http
            .get(&req.url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed {
                op: "download",
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                op: "download",
                status: response.status().as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::RequestFailed {
                op: "download",
                reason: e.to_string(),
            })?;
        let local_path = req.local_dir.join(&req.local_file_name);
        tokio::fs::write(&local_path, &bytes).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), ClientError> {
        Ok(())
    }
}
