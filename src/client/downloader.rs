//! Auto-download decorator.
//!
//! When enabled, chat responses that reference generated files get those
//! files fetched in the background, and the response is annotated with the
//! origin/local name pairs so callers can find them later.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::client::types::{
    ChatRequest, ChatResponse, DownloadRequest, SpecDownload, UploadRequest, UploadResponse,
};
use crate::client::Client;
use crate::error::ClientError;

/// Wraps another client and fetches generated files after each chat turn.
pub struct DownloaderClient {
    inner: Arc<dyn Client>,
    enabled: bool,
    local_dir: PathBuf,
    prefix: String,
}

impl DownloaderClient {
    pub fn new(inner: Arc<dyn Client>, enabled: bool, local_dir: PathBuf, prefix: String) -> Self {
        Self {
            inner,
            enabled,
            local_dir,
            prefix,
        }
    }
}

#[async_trait]
impl Client for DownloaderClient {
    async fn upload(&self, req: UploadRequest) -> Result<UploadResponse, ClientError> {
        self.inner.upload(req).await
    }

    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ClientError> {
        let id = req.id.clone();
        let pid = req.pid.clone();
        let mut resp = self.inner.chat(req).await?;

        if self.enabled && !resp.downloads.is_empty() {
            for url in resp.downloads.clone() {
                let Some(local_file_name) = local_download_name(&self.prefix, &id, &pid, &url)
                else {
                    tracing::warn!(id = %id, pid = %pid, url = %url, "No filename in download URL");
                    continue;
                };

                resp.spec_downloads.push(SpecDownload {
                    origin: url.clone(),
                    local: local_file_name.clone(),
                });

                let inner = Arc::clone(&self.inner);
                let request = DownloadRequest {
                    id: id.clone(),
                    pid: pid.clone(),
                    url,
                    local_dir: self.local_dir.clone(),
                    local_file_name,
                };
                tokio::spawn(async move {
                    if let Err(e) = inner.download(request).await {
                        tracing::warn!(error = %e, "Background download failed");
                    }
                });
            }
        }
        Ok(resp)
    }

    async fn download(&self, req: DownloadRequest) -> Result<(), ClientError> {
        self.inner.download(req).await
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.inner.close().await
    }
}

/// Derive a collision-free local file name from a download URL.
///
/// The service hands back URLs whose `filename` query parameter may be
/// HTML-entity-escaped or `;`-delimited; normalize before parsing. Returns
/// `None` when no filename can be recovered.
fn local_download_name(prefix: &str, id: &str, pid: &str, url: &str) -> Option<String> {
    let normalized = url.replace("&amp;", "&").replace(';', "&");
    let parsed = reqwest::Url::parse(&normalized).ok()?;

    let filename = parsed
        .query_pairs()
        .find(|(key, _)| key.trim() == "filename")
        .map(|(_, value)| value.trim().to_string())
        .filter(|v| !v.is_empty())?;

    Some(
        [
            prefix,
            id,
            pid,
            &Uuid::new_v4().simple().to_string(),
            &filename,
        ]
        .join("_"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_name_from_clean_url() {
        let name =
            local_download_name("pre", "j1", "a1", "https://host/files?filename=report.xlsx")
                .unwrap();
        assert!(name.starts_with("pre_j1_a1_"));
        assert!(name.ends_with("_report.xlsx"));
    }

    #[test]
    fn normalizes_entity_escaped_separators() {
        let name = local_download_name(
            "pre",
            "j1",
            "a1",
            "https://host/files?sig=abc&amp;filename=out.csv",
        )
        .unwrap();
        assert!(name.ends_with("_out.csv"));

        let name = local_download_name(
            "pre",
            "j1",
            "a1",
            "https://host/files?sig=abc; filename=out.csv",
        )
        .unwrap();
        assert!(name.ends_with("_out.csv"));
    }

    #[test]
    fn missing_filename_yields_none() {
        assert!(local_download_name("pre", "j1", "a1", "https://host/files?sig=abc").is_none());
        assert!(local_download_name("pre", "j1", "a1", "not a url").is_none());
    }

    #[test]
    fn names_are_unique_per_call() {
        let url = "https://host/files?filename=a.txt";
        let first = local_download_name("pre", "j1", "a1", url).unwrap();
        let second = local_download_name("pre", "j1", "a1", url).unwrap();
        assert_ne!(first, second);
    }
}
