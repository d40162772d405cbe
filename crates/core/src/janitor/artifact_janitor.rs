//! Filesystem side of artifact ownership.

use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::JanitorError;
use crate::metrics::JANITOR_REMOVALS;

/// Longest scope id used verbatim as a directory name.
const MAX_PLAIN_SCOPE_LEN: usize = 64;

/// A per-request temporary directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    id: String,
    dir: PathBuf,
}

impl Scope {
    /// The caller's scope id (chat or session id).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Result of a stale-artifact sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub files_removed: usize,
    pub dirs_removed: usize,
    pub bytes_freed: u64,
}

/// Owns the temporary root and everything below it.
#[derive(Debug, Clone)]
pub struct ArtifactJanitor {
    root: PathBuf,
}

impl ArtifactJanitor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory grouping all requests for `scope_id`.
    pub fn scope_parent(&self, scope_id: &str) -> PathBuf {
        self.root.join(scope_component(scope_id))
    }

    /// Create a fresh, exclusively owned directory for one request.
    ///
    /// Each call gets its own subdirectory, so concurrent requests sharing a
    /// scope id never see each other's files.
    pub async fn scope_dir(&self, scope_id: &str) -> Result<Scope, JanitorError> {
        let dir = self
            .scope_parent(scope_id)
            .join(Uuid::new_v4().simple().to_string());

        // A concurrent release can prune the shared parent between creating
        // it and creating our subdirectory.
        let mut tries = 0;
        loop {
            match fs::create_dir_all(&dir).await {
                Ok(()) => break,
                Err(e) if e.kind() == ErrorKind::NotFound && tries < 2 => tries += 1,
                Err(e) => return Err(JanitorError::CreateDir { path: dir, source: e }),
            }
        }

        debug!("Created scope directory {:?}", dir);
        Ok(Scope {
            id: scope_id.to_string(),
            dir,
        })
    }

    /// Remove a file or directory. Returns whether anything was removed.
    ///
    /// Removing a path that is already gone is not an error.
    pub async fn cleanup(&self, path: &Path) -> Result<bool, JanitorError> {
        let meta = match fs::symlink_metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(JanitorError::remove(path, e)),
        };

        let result = if meta.is_dir() {
            fs::remove_dir_all(path).await
        } else {
            fs::remove_file(path).await
        };

        match result {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(JanitorError::remove(path, e)),
        }
    }

    /// Remove everything in the scope directory except `keep`.
    pub async fn purge(&self, scope: &Scope, keep: Option<&Path>) -> Result<usize, JanitorError> {
        let mut entries = match fs::read_dir(&scope.dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if keep.is_some_and(|k| k == path) {
                continue;
            }
            if self.cleanup(&path).await? {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!("Purged {} leftover file(s) from {:?}", removed, scope.dir);
            JANITOR_REMOVALS
                .with_label_values(&["purge"])
                .inc_by(removed as u64);
        }
        Ok(removed)
    }

    /// Remove the whole scope directory, and its parent if no other request uses it.
    pub async fn release_scope(&self, scope: &Scope) -> Result<(), JanitorError> {
        self.release_dir(&scope.dir).await
    }

    /// Delete a handed-off artifact together with its scope directory.
    pub async fn release_artifact(&self, scope_dir: &Path) -> Result<(), JanitorError> {
        if !scope_dir.starts_with(&self.root) || scope_dir == self.root {
            return Err(JanitorError::OutsideRoot {
                path: scope_dir.to_path_buf(),
            });
        }
        self.release_dir(scope_dir).await
    }

    async fn release_dir(&self, dir: &Path) -> Result<(), JanitorError> {
        if self.cleanup(dir).await? {
            JANITOR_REMOVALS.with_label_values(&["release"]).inc();
            debug!("Released scope directory {:?}", dir);
        }
        if let Some(parent) = dir.parent() {
            if parent != self.root {
                // Fails harmlessly while another request for the same scope is active.
                let _ = fs::remove_dir(parent).await;
            }
        }
        Ok(())
    }

    /// Remove files older than `max_age` and prune emptied directories.
    ///
    /// A directory is only pruned if it was already older than `max_age`
    /// before the sweep, so freshly created scope directories survive.
    pub async fn sweep_stale(&self, max_age: Duration) -> Result<SweepReport, JanitorError> {
        let mut report = SweepReport::default();
        let now = SystemTime::now();
        let is_stale = |t: SystemTime| {
            now.duration_since(t)
                .map(|age| age > max_age)
                .unwrap_or(false)
        };

        let mut stack = vec![self.root.clone()];
        let mut stale_dirs: Vec<PathBuf> = Vec::new();

        while let Some(dir) = stack.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(e) => e,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let meta = match entry.metadata().await {
                    Ok(m) => m,
                    Err(_) => continue,
                };
                let modified = meta.modified().unwrap_or(now);

                if meta.is_dir() {
                    if is_stale(modified) {
                        stale_dirs.push(path.clone());
                    }
                    stack.push(path);
                } else if is_stale(modified) {
                    match fs::remove_file(&path).await {
                        Ok(()) => {
                            report.files_removed += 1;
                            report.bytes_freed += meta.len();
                        }
                        Err(e) if e.kind() == ErrorKind::NotFound => {}
                        Err(e) => warn!("Failed to remove stale file {:?}: {}", path, e),
                    }
                }
            }
        }

        // Deepest first so parents can become empty.
        stale_dirs.sort_by_key(|p| std::cmp::Reverse(p.components().count()));
        for dir in stale_dirs {
            if fs::remove_dir(&dir).await.is_ok() {
                report.dirs_removed += 1;
            }
        }

        if report.files_removed > 0 || report.dirs_removed > 0 {
            info!(
                "Sweep removed {} file(s) and {} dir(s), freed {} bytes",
                report.files_removed, report.dirs_removed, report.bytes_freed
            );
            JANITOR_REMOVALS
                .with_label_values(&["sweep"])
                .inc_by((report.files_removed + report.dirs_removed) as u64);
        }
        Ok(report)
    }
}

/// Directory name for a scope id: the id itself when it is a plain token,
/// otherwise a short hash.
fn scope_component(scope_id: &str) -> String {
    let plain = !scope_id.is_empty()
        && scope_id.len() <= MAX_PLAIN_SCOPE_LEN
        && !scope_id.starts_with("x-")
        && scope_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if plain {
        scope_id.to_string()
    } else {
        let digest = Sha256::digest(scope_id.as_bytes());
        format!("x-{}", &format!("{:x}", digest)[..16])
    }
}
