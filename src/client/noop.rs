//! Canned-response client for dry runs and tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::client::types::{
    Attachment, ChatRequest, ChatResponse, DownloadRequest, Part, UploadKind, UploadRequest,
    UploadResponse,
};
use crate::client::Client;
use crate::error::ClientError;

/// A client that answers every call locally without touching the network.
#[derive(Debug, Default)]
pub struct NoopClient;

impl NoopClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Client for NoopClient {
    async fn upload(&self, req: UploadRequest) -> Result<UploadResponse, ClientError> {
        let response = match req.kind {
            UploadKind::File => UploadResponse {
                conversation_id: req.conversation_id,
                attachment: Some(Attachment {
                    id: Uuid::new_v4().to_string(),
                    name: req
                        .upload_path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    size: 100,
                    file_token_size: Some(10),
                    mime_type: "application/octet-stream".to_string(),
                    width: None,
                    height: None,
                }),
                part: None,
            },
            UploadKind::Multimodal => UploadResponse {
                conversation_id: req.conversation_id,
                attachment: None,
                part: Some(Part {
                    name: None,
                    asset_pointer: format!("file-service://{}", Uuid::new_v4()),
                    size_bytes: 100,
                    width: 10,
                    height: 10,
                    mime_type: Some("image/png".to_string()),
                }),
            },
        };
        Ok(response)
    }

    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ClientError> {
        Ok(ChatResponse {
            created: 0,
            message_id: Uuid::new_v4().to_string(),
            conversation_id: req
                .conversation_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            end_turn: true,
            contents: vec![serde_json::json!(format!("echo: {}", req.message))],
            downloads: vec![],
            spec_downloads: vec![],
        })
    }

    async fn download(&self, _req: DownloadRequest) -> Result<(), ClientError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chat_threads_conversation_id() {
        let client = NoopClient::new();
        let resp = client
            .chat(ChatRequest {
                id: "j".to_string(),
                pid: "a".to_string(),
                gizmo_id: None,
                message: "hi".to_string(),
                parent_message_id: None,
                conversation_id: Some("c-9".to_string()),
                stream: false,
                model: "m".to_string(),
                attachments: vec![],
                parts: vec![],
                history_and_training_disabled: false,
            })
            .await
            .unwrap();
        assert_eq!(resp.conversation_id, "c-9");
    }
}
