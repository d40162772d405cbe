//! Credential artifact (Netscape `cookies.txt`) resolution.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Header written by browsers and cookie export tools.
const NETSCAPE_HEADERS: &[&str] = &["# Netscape HTTP Cookie File", "# HTTP Cookie File"];

/// Why the credential artifact is unusable.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no credential file configured")]
    NotConfigured,

    #[error("credential file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("credential file is empty: {path}")]
    Empty { path: PathBuf },

    #[error("credential file {path} is not a Netscape cookie file: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("failed to read credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Locates and validates the credential artifact used by credentialed strategies.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    path: Option<PathBuf>,
}

impl CredentialStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// A store with no credential configured.
    pub fn none() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Resolve the credential file, checking it exists and looks like a cookie export.
    ///
    /// The file is read on every call so a credential dropped in place while
    /// the service is running is picked up by the next request.
    pub async fn resolve(&self) -> Result<PathBuf, CredentialError> {
        let path = self.path.as_ref().ok_or(CredentialError::NotConfigured)?;

        let contents = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CredentialError::NotFound { path: path.clone() });
            }
            Err(e) => {
                return Err(CredentialError::Io {
                    path: path.clone(),
                    source: e,
                });
            }
        };

        validate_netscape(&contents).map_err(|reason| match reason {
            FormatIssue::Empty => CredentialError::Empty { path: path.clone() },
            FormatIssue::NoRecords => CredentialError::InvalidFormat {
                path: path.clone(),
                reason: "no header and no cookie records".to_string(),
            },
        })?;

        debug!("Credential file {:?} is usable", path);
        Ok(path.clone())
    }
}

enum FormatIssue {
    Empty,
    NoRecords,
}

fn validate_netscape(contents: &str) -> Result<(), FormatIssue> {
    if contents.trim().is_empty() {
        return Err(FormatIssue::Empty);
    }

    let has_header = contents
        .lines()
        .take(5)
        .any(|line| NETSCAPE_HEADERS.iter().any(|h| line.trim_start().starts_with(h)));

    let has_record = contents.lines().any(|line| {
        let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
        !line.starts_with('#') && line.split('\t').count() == 7
    });

    if has_header || has_record {
        Ok(())
    } else {
        Err(FormatIssue::NoRecords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VALID: &str = "# Netscape HTTP Cookie File\n\
        .youtube.com\tTRUE\t/\tTRUE\t1999999999\tPREF\tf6=40000000\n";

    #[tokio::test]
    async fn test_not_configured() {
        let store = CredentialStore::none();
        assert!(matches!(
            store.resolve().await,
            Err(CredentialError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(Some(dir.path().join("cookies.txt")));
        assert!(matches!(
            store.resolve().await,
            Err(CredentialError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_valid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.txt");
        std::fs::write(&path, VALID).unwrap();

        let store = CredentialStore::new(Some(path.clone()));
        assert_eq!(store.resolve().await.unwrap(), path);
    }

    #[tokio::test]
    async fn test_headerless_records_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.txt");
        std::fs::write(
            &path,
            "#HttpOnly_.tiktok.com\tTRUE\t/\tTRUE\t1999999999\tsid\tabc\n",
        )
        .unwrap();

        let store = CredentialStore::new(Some(path));
        assert!(store.resolve().await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_and_garbage_rejected() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "  \n").unwrap();
        let garbage = dir.path().join("garbage.txt");
        std::fs::write(&garbage, "{\"cookies\": []}").unwrap();

        assert!(matches!(
            CredentialStore::new(Some(empty)).resolve().await,
            Err(CredentialError::Empty { .. })
        ));
        assert!(matches!(
            CredentialStore::new(Some(garbage)).resolve().await,
            Err(CredentialError::InvalidFormat { .. })
        ));
    }
}
