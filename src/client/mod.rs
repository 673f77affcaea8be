//! Remote chat-service capability.
//!
//! The engine depends only on the [`Client`] trait. The concrete transport
//! ([`HttpClient`]) and the decorators layered over it ([`LoggingClient`],
//! [`DownloaderClient`]) all implement the same trait and compose by holding
//! the next client in the chain.

mod downloader;
mod http;
mod logger;
mod noop;
mod types;

pub use downloader::DownloaderClient;
pub use http::{HttpClient, HttpClientConfig};
pub use logger::LoggingClient;
pub use noop::NoopClient;
pub use types::{
    Attachment, ChatRequest, ChatResponse, DownloadRequest, Part, SpecDownload, UploadKind,
    UploadRequest, UploadResponse,
};

use async_trait::async_trait;

use crate::error::ClientError;

/// Abstract remote capability consumed by the batch engine.
#[async_trait]
pub trait Client: Send + Sync {
    /// Upload a local file, returning its server-side descriptor.
    async fn upload(&self, req: UploadRequest) -> Result<UploadResponse, ClientError>;

    /// Send one chat turn and return the response.
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ClientError>;

    /// Fetch a generated file to local storage.
    async fn download(&self, req: DownloadRequest) -> Result<(), ClientError>;

    /// Release any resources held by the client.
    async fn close(&self) -> Result<(), ClientError>;
}
