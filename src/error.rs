//! Error types for chatbatch.

use std::path::PathBuf;

/// Top-level error type for the batch runner.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Credentials file {path:?} is invalid: {reason}")]
    Credentials { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote-capability errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{op} request failed: {reason}")]
    RequestFailed { op: &'static str, reason: String },

    #[error("{op} returned status {status}")]
    Status { op: &'static str, status: u16 },

    #[error("Invalid {op} response: {source}")]
    InvalidResponse {
        op: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Input-file errors.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("Failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid job record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Batch-service errors.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Service is {state}, cannot {action}")]
    InvalidState {
        state: &'static str,
        action: &'static str,
    },

    #[error("Worker pool rejected job {id}: {reason}")]
    SubmitFailed { id: String, reason: String },

    #[error("Job {id} produced no answer")]
    NoAnswer { id: String },

    #[error("Failed to write {path:?}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for the batch runner.
pub type Result<T> = std::result::Result<T, Error>;
