//! Configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Batch run configuration.
///
/// Populated from environment variables in `main.rs`; library callers build
/// it directly.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Chat endpoint URL.
    pub chat_url: String,
    /// Upload endpoint URL.
    pub upload_url: String,
    /// Input JSONL path (one job per line).
    pub input: PathBuf,
    /// Output JSONL path, overwritten once at close.
    pub output: PathBuf,
    /// Worker pool capacity. Must be > 0.
    pub concurrency: usize,
    /// Model name sent with every chat turn.
    pub model: String,
    /// Custom-variant (gizmo) identifier, if any.
    pub gizmo_id: Option<String>,
    /// Disable server-side history/training for the run's conversations.
    pub history_and_training_disabled: bool,
    /// Resume mode: skip jobs already marked successful in the input.
    pub resume: bool,
    /// Download generated files referenced by chat responses.
    pub enable_download: bool,
    /// Directory for downloaded files. Defaults to the input file's directory.
    pub download_dir: Option<PathBuf>,
    /// Prefix prepended to downloaded file names to avoid collisions.
    pub download_prefix: String,
    /// Write periodic recovery snapshots of the job store.
    pub enable_checkpoint: bool,
    /// Interval between checkpoint ticks.
    pub checkpoint_interval: Duration,
    /// How long `close` waits for in-flight jobs to drain.
    pub shutdown_grace: Duration,
    /// Credentials file path. Defaults to `$HOME/.chatbatch-credentials.json`.
    pub credentials: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chat_url: String::new(),
            upload_url: String::new(),
            input: PathBuf::from("example.jsonl"),
            output: PathBuf::from("out.jsonl"),
            concurrency: 60,
            model: "gpt-4-gizmo".to_string(),
            gizmo_id: None,
            history_and_training_disabled: true,
            resume: false,
            enable_download: true,
            download_dir: None,
            download_prefix: "chatbatch".to_string(),
            enable_checkpoint: true,
            checkpoint_interval: Duration::from_secs(60 * 60),
            shutdown_grace: Duration::from_secs(6 * 60),
            credentials: None,
        }
    }
}

impl BatchConfig {
    /// Build a config from `CHATBATCH_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            chat_url: env_or("CHATBATCH_CHAT_URL", &defaults.chat_url),
            upload_url: env_or("CHATBATCH_UPLOAD_URL", &defaults.upload_url),
            input: PathBuf::from(env_or(
                "CHATBATCH_IN",
                &defaults.input.display().to_string(),
            )),
            output: PathBuf::from(env_or(
                "CHATBATCH_OUT",
                &defaults.output.display().to_string(),
            )),
            concurrency: env_parse("CHATBATCH_CONCURRENCY", defaults.concurrency),
            model: env_or("CHATBATCH_MODEL", &defaults.model),
            gizmo_id: std::env::var("CHATBATCH_GIZMO_ID")
                .ok()
                .filter(|s| !s.is_empty()),
            history_and_training_disabled: env_parse(
                "CHATBATCH_HISTORY_DISABLED",
                defaults.history_and_training_disabled,
            ),
            resume: env_parse("CHATBATCH_RESUME", defaults.resume),
            enable_download: env_parse("CHATBATCH_DOWNLOAD", defaults.enable_download),
            download_dir: std::env::var("CHATBATCH_DOWNLOAD_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            download_prefix: env_or("CHATBATCH_DOWNLOAD_PREFIX", &defaults.download_prefix),
            enable_checkpoint: env_parse("CHATBATCH_CHECKPOINT", defaults.enable_checkpoint),
            checkpoint_interval: Duration::from_secs(
                env_parse(
                    "CHATBATCH_CHECKPOINT_INTERVAL_MIN",
                    defaults.checkpoint_interval.as_secs() / 60,
                ) * 60,
            ),
            shutdown_grace: Duration::from_secs(env_parse(
                "CHATBATCH_SHUTDOWN_GRACE_SECS",
                defaults.shutdown_grace.as_secs(),
            )),
            credentials: std::env::var("CHATBATCH_CREDENTIALS")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Validate the configuration, resolving defaults that depend on other
    /// fields (the download directory falls back to the input's directory).
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.chat_url.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "chat_url".to_string(),
                hint: "set CHATBATCH_CHAT_URL to the chat endpoint".to_string(),
            });
        }
        if self.upload_url.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "upload_url".to_string(),
                hint: "set CHATBATCH_UPLOAD_URL to the upload endpoint".to_string(),
            });
        }
        if self.input.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "input".to_string(),
                hint: "set CHATBATCH_IN to the input JSONL file".to_string(),
            });
        }
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "output".to_string(),
                hint: "set CHATBATCH_OUT to the output JSONL file".to_string(),
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "concurrency".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.checkpoint_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "checkpoint_interval".to_string(),
                message: "must be non-zero".to_string(),
            });
        }

        if self.enable_download {
            match &self.download_dir {
                Some(dir) => {
                    if !dir.is_dir() {
                        return Err(ConfigError::InvalidValue {
                            key: "download_dir".to_string(),
                            message: format!("{} is not a directory", dir.display()),
                        });
                    }
                }
                None => {
                    self.download_dir = Some(parent_dir(&self.input));
                }
            }
        }
        Ok(())
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> BatchConfig {
        BatchConfig {
            chat_url: "http://localhost/chat".to_string(),
            upload_url: "http://localhost/upload".to_string(),
            enable_download: false,
            ..BatchConfig::default()
        }
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = BatchConfig {
            concurrency: 0,
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn missing_chat_url_is_rejected() {
        let mut config = BatchConfig {
            chat_url: String::new(),
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired { .. })
        ));
    }

    #[test]
    fn download_dir_defaults_to_input_parent() {
        let mut config = BatchConfig {
            enable_download: true,
            input: PathBuf::from("data/in.jsonl"),
            ..valid()
        };
        config.validate().unwrap();
        assert_eq!(config.download_dir, Some(PathBuf::from("data")));
    }
}
