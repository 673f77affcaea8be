//! Job records — the unit of work and its persisted JSONL shape.
//!
//! One job per input line. A job with no `iErr` is considered already
//! successfully completed; resume mode uses that to skip it, and a fresh run
//! pre-marks every clean job with a placeholder error so the invariant holds
//! before any attempt is made.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error code recorded when a job attempt fails for any reason.
pub const CODE_ATTEMPT_FAILED: u16 = 501;

/// Placeholder code set at load time on jobs that have not been attempted yet.
pub const CODE_NOT_READY: u16 = 400;

/// One batch job: an ordered list of asks and the answers they produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub asks: Vec<Ask>,
    #[serde(default)]
    pub answers: Vec<Value>,
    #[serde(rename = "iErr", default, skip_serializing_if = "Option::is_none")]
    pub err: Option<JobErr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// One conversational turn within a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ask {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

/// Terminal error recorded on a failed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobErr {
    pub code: u16,
    pub message: String,
}

impl JobErr {
    /// Generic attempt failure carrying the underlying message.
    ///
    /// Upload, chat, zero-answer and submission failures all collapse into
    /// this one code; the message is the only distinguishing detail.
    pub fn attempt_failed(message: impl Into<String>) -> Self {
        Self {
            code: CODE_ATTEMPT_FAILED,
            message: message.into(),
        }
    }

    /// Placeholder marking a job as not yet attempted.
    pub fn not_ready() -> Self {
        Self {
            code: CODE_NOT_READY,
            message: "resource is not ready".to_string(),
        }
    }
}

impl Job {
    /// A job with no recorded error has already completed successfully.
    pub fn is_succeeded(&self) -> bool {
        self.err.is_none()
    }
}
