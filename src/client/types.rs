//! Wire types for the remote chat service.
//!
//! Field names mirror the service's JSON contract; identifiers used only for
//! logging and download naming are skipped during serialization.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What an upload becomes on the server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadKind {
    /// File attachment ("my files").
    #[serde(rename = "my_files")]
    File,
    /// Multimodal image part.
    #[serde(rename = "multimodal")]
    Multimodal,
}

/// Request to upload one local file before a chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct UploadRequest {
    /// Job identifier (logging only).
    #[serde(skip)]
    pub id: String,
    /// Ask identifier (logging only).
    #[serde(skip)]
    pub pid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub upload_path: PathBuf,
    #[serde(rename = "upload_type")]
    pub kind: UploadKind,
}

/// Server-issued descriptor for an uploaded file attachment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub size: i64,
    #[serde(
        rename = "fileTokenSize",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub file_token_size: Option<i64>,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
}

/// Server-issued descriptor for an uploaded multimodal image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub asset_pointer: String,
    pub size_bytes: i64,
    pub width: i64,
    pub height: i64,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Response to an upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    #[serde(default)]
    pub part: Option<Part>,
}

/// One chat turn sent to the service.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Job identifier (logging only).
    #[serde(skip)]
    pub id: String,
    /// Ask identifier (logging only).
    #[serde(skip)]
    pub pid: String,
    pub gizmo_id: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
    pub model: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Part>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub history_and_training_disabled: bool,
}

/// Response to a chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub created: i64,
    pub message_id: String,
    pub conversation_id: String,
    pub end_turn: bool,
    pub contents: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub downloads: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spec_downloads: Vec<SpecDownload>,
}

/// Origin/local pair recorded for a fetched generated file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecDownload {
    pub origin: String,
    pub local: String,
}

/// Request to fetch a generated file to local storage.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub id: String,
    pub pid: String,
    pub url: String,
    pub local_dir: PathBuf,
    pub local_file_name: String,
}
