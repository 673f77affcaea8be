//! Access-token retrieval from a local credentials file.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

/// File name probed under `$HOME` when no explicit path is configured.
const DEFAULT_FILE_NAME: &str = ".chatbatch-credentials.json";

/// On-disk credentials shape.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    access_token: String,
    #[serde(default)]
    #[allow(dead_code)]
    expired_at: Option<i64>,
    #[serde(default)]
    #[allow(dead_code)]
    username: Option<String>,
}

/// Load the access token from `path`, or from the home-directory default.
pub fn load_access_token(path: Option<&Path>) -> Result<SecretString, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_path()?,
    };

    let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::Credentials {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    if raw.trim().is_empty() {
        return Err(ConfigError::Credentials {
            path,
            reason: "file is empty".to_string(),
        });
    }

    let parsed: CredentialsFile =
        serde_json::from_str(&raw).map_err(|e| ConfigError::Credentials {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    if parsed.access_token.is_empty() {
        return Err(ConfigError::Credentials {
            path,
            reason: "access_token is empty".to_string(),
        });
    }
    Ok(SecretString::from(parsed.access_token))
}

fn default_path() -> Result<PathBuf, ConfigError> {
    let home = std::env::var("HOME").map_err(|_| ConfigError::MissingRequired {
        key: "HOME".to_string(),
        hint: "set CHATBATCH_CREDENTIALS to the credentials file".to_string(),
    })?;
    Ok(PathBuf::from(home).join(DEFAULT_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    use secrecy::ExposeSecret;
    use std::io::Write;

    #[test]
    fn loads_token_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"access_token":"tok-123","expired_at":0,"username":"u"}}"#
        )
        .unwrap();

        let token = load_access_token(Some(file.path())).unwrap();
        assert_eq!(token.expose_secret(), "tok-123");
    }

    #[test]
    fn empty_token_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"access_token":""}}"#).unwrap();

        assert!(matches!(
            load_access_token(Some(file.path())),
            Err(ConfigError::Credentials { .. })
        ));
    }

    #[test]
    fn missing_file_is_rejected() {
        assert!(matches!(
            load_access_token(Some(Path::new("/nonexistent/creds.json"))),
            Err(ConfigError::Credentials { .. })
        ));
    }
}
