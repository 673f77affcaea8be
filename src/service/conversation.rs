//! Per-job conversation orchestration.
//!
//! A job's asks run strictly in order: each turn first uploads any local
//! images and files, then sends the chat message with the descriptors the
//! uploads returned, then adopts the response's conversation/parent
//! identifiers for the next turn. Any failure aborts the whole job; answers
//! are only handed back once every turn has succeeded.

use serde_json::Value;

use crate::client::{ChatRequest, Client, UploadKind, UploadRequest};
use crate::config::BatchConfig;
use crate::error::{ClientError, Error, ServiceError};
use crate::job::Job;

/// Conversation identifiers threaded across a job's turns.
#[derive(Debug, Default)]
struct ConversationState {
    conversation_id: Option<String>,
    parent_message_id: Option<String>,
}

/// Execute every ask of `job` in order, returning the collected answers.
///
/// The job itself is not mutated; committing answers (or recording the
/// failure) is the caller's responsibility.
pub async fn run_job(
    client: &dyn Client,
    config: &BatchConfig,
    job: &Job,
) -> Result<Vec<Value>, Error> {
    let mut state = ConversationState::default();
    let mut answers = Vec::with_capacity(job.asks.len());

    for ask in &job.asks {
        tracing::debug!(id = %job.id, pid = %ask.id, "Running ask");

        let mut parts = Vec::new();
        let mut attachments = Vec::new();

        for image in &ask.images {
            let resp = client
                .upload(UploadRequest {
                    id: job.id.clone(),
                    pid: ask.id.clone(),
                    conversation_id: state.conversation_id.clone(),
                    upload_path: image.into(),
                    kind: UploadKind::Multimodal,
                })
                .await?;
            let part = resp.part.ok_or_else(|| ClientError::RequestFailed {
                op: "upload",
                reason: "response carried no multimodal part".to_string(),
            })?;
            parts.push(part);
        }

        for file in &ask.files {
            let resp = client
                .upload(UploadRequest {
                    id: job.id.clone(),
                    pid: ask.id.clone(),
                    conversation_id: state.conversation_id.clone(),
                    upload_path: file.into(),
                    kind: UploadKind::File,
                })
                .await?;
            let attachment = resp.attachment.ok_or_else(|| ClientError::RequestFailed {
                op: "upload",
                reason: "response carried no attachment".to_string(),
            })?;
            attachments.push(attachment);
        }

        let resp = client
            .chat(ChatRequest {
                id: job.id.clone(),
                pid: ask.id.clone(),
                gizmo_id: config.gizmo_id.clone(),
                message: ask.content.clone(),
                parent_message_id: state.parent_message_id.take(),
                conversation_id: state.conversation_id.take(),
                stream: false,
                model: config.model.clone(),
                attachments,
                parts,
                history_and_training_disabled: config.history_and_training_disabled,
            })
            .await?;

        state.parent_message_id = Some(resp.message_id.clone());
        state.conversation_id = Some(resp.conversation_id.clone());
        answers.push(serde_json::to_value(&resp).map_err(|e| ClientError::InvalidResponse {
            op: "chat",
            source: e,
        })?);
    }

    if answers.is_empty() {
        return Err(ServiceError::NoAnswer {
            id: job.id.clone(),
        }
        .into());
    }
    Ok(answers)
}
