//! Drop guard for scope directories.

use std::path::PathBuf;
use tracing::debug;

use super::artifact_janitor::Scope;

/// Removes a scope directory when dropped, unless disarmed.
///
/// Covers the path where a retrieval future is dropped mid-flight (client
/// disconnect, outer timeout) and no async cleanup gets to run.
#[derive(Debug)]
pub struct ScopeGuard {
    dir: Option<PathBuf>,
}

impl ScopeGuard {
    pub fn new(scope: &Scope) -> Self {
        Self::for_dir(scope.dir())
    }

    /// Guard a scope directory that has already been handed off.
    pub fn for_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Cleanup has been handled explicitly; do nothing on drop.
    pub fn disarm(&mut self) {
        self.dir = None;
    }

    pub fn is_armed(&self) -> bool {
        self.dir.is_some()
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            debug!("Scope guard removing abandoned directory {:?}", dir);
            let _ = std::fs::remove_dir_all(&dir);
            if let Some(parent) = dir.parent() {
                let _ = std::fs::remove_dir(parent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::janitor::ArtifactJanitor;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_guard_removes_on_drop() {
        let temp = TempDir::new().unwrap();
        let janitor = ArtifactJanitor::new(temp.path());
        let scope = janitor.scope_dir("g").await.unwrap();
        std::fs::write(scope.dir().join("partial.part"), b"x").unwrap();

        {
            let guard = ScopeGuard::new(&scope);
            assert!(guard.is_armed());
        }
        assert!(!scope.dir().exists());
        assert!(!janitor.scope_parent("g").exists());
    }

    #[tokio::test]
    async fn test_disarmed_guard_leaves_dir() {
        let temp = TempDir::new().unwrap();
        let janitor = ArtifactJanitor::new(temp.path());
        let scope = janitor.scope_dir("g").await.unwrap();

        {
            let mut guard = ScopeGuard::new(&scope);
            guard.disarm();
        }
        assert!(scope.dir().exists());
    }

    #[tokio::test]
    async fn test_guard_for_handed_off_dir() {
        let temp = TempDir::new().unwrap();
        let janitor = ArtifactJanitor::new(temp.path());
        let scope = janitor.scope_dir("h").await.unwrap();
        std::fs::write(scope.dir().join("clip.mp4"), b"x").unwrap();
        let handed_off = scope.dir().to_path_buf();

        drop(ScopeGuard::for_dir(&handed_off));
        assert!(!handed_off.exists());
    }
}
