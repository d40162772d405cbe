//! Mock media backend for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::backend::{
    BackendError, BackendInvocation, BackendOutput, MediaBackend, MediaInfo, ProbeInvocation,
};
use crate::strategy::ClientProfile;

/// What the mock does when invoked with a given client profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// Write a media file of `bytes` bytes into the output directory.
    Succeed { bytes: u64, title: Option<String> },
    /// Fail with the given diagnostics, classified like real backend output.
    Fail { message: String },
    /// Leave a partial file behind, then fail.
    PartialThenFail { partial_bytes: u64, message: String },
    /// Never complete. Only a deadline or cancellation ends the attempt.
    Hang,
    /// Sleep, then behave like `then`.
    Delay {
        duration: Duration,
        then: Box<MockBehavior>,
    },
    /// Exit cleanly without producing a file.
    NoArtifact,
    /// Report `path` as the artifact without writing anything.
    ReportPath(PathBuf),
}

impl MockBehavior {
    pub fn succeed(bytes: u64) -> Self {
        Self::Succeed { bytes, title: None }
    }

    pub fn succeed_titled(bytes: u64, title: impl Into<String>) -> Self {
        Self::Succeed {
            bytes,
            title: Some(title.into()),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail {
            message: message.into(),
        }
    }

    pub fn partial_then_fail(partial_bytes: u64, message: impl Into<String>) -> Self {
        Self::PartialThenFail {
            partial_bytes,
            message: message.into(),
        }
    }

    pub fn delayed(duration: Duration, then: MockBehavior) -> Self {
        Self::Delay {
            duration,
            then: Box::new(then),
        }
    }
}

/// Mock implementation of the [`MediaBackend`] trait.
///
/// Behavior is configured per [`ClientProfile`]; profiles without an
/// explicit behavior use the default, which fails with a generic error.
/// Every invocation is recorded before it is acted upon. Probes use the
/// same behaviors and are recorded separately.
///
/// # Example
///
/// ```rust,ignore
/// use clipfetch_core::testing::{MockBackend, MockBehavior};
///
/// let backend = MockBackend::new();
/// backend.set_behavior(ClientProfile::MobileB, MockBehavior::succeed(4096)).await;
///
/// let orchestrator = Orchestrator::new(Arc::new(backend.clone()), catalog, creds, janitor);
/// orchestrator.retrieve(&request).await?;
///
/// assert_eq!(backend.invocation_count().await, 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    behaviors: Arc<RwLock<HashMap<ClientProfile, MockBehavior>>>,
    default_behavior: Arc<RwLock<MockBehavior>>,
    invocations: Arc<RwLock<Vec<BackendInvocation>>>,
    probes: Arc<RwLock<Vec<ProbeInvocation>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            behaviors: Arc::new(RwLock::new(HashMap::new())),
            default_behavior: Arc::new(RwLock::new(MockBehavior::fail(
                "ERROR: mock backend has no behavior for this profile",
            ))),
            invocations: Arc::new(RwLock::new(Vec::new())),
            probes: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn set_behavior(&self, profile: ClientProfile, behavior: MockBehavior) {
        self.behaviors.write().await.insert(profile, behavior);
    }

    pub async fn set_default_behavior(&self, behavior: MockBehavior) {
        *self.default_behavior.write().await = behavior;
    }

    pub async fn recorded_invocations(&self) -> Vec<BackendInvocation> {
        self.invocations.read().await.clone()
    }

    pub async fn invocation_count(&self) -> usize {
        self.invocations.read().await.len()
    }

    /// Profiles in the order they were invoked.
    pub async fn invoked_profiles(&self) -> Vec<ClientProfile> {
        self.invocations
            .read()
            .await
            .iter()
            .map(|i| i.profile)
            .collect()
    }

    /// Profiles probed, in order.
    pub async fn probed_profiles(&self) -> Vec<ClientProfile> {
        self.probes.read().await.iter().map(|p| p.profile).collect()
    }

    async fn behavior_for(&self, profile: ClientProfile) -> MockBehavior {
        match self.behaviors.read().await.get(&profile) {
            Some(behavior) => behavior.clone(),
            None => self.default_behavior.read().await.clone(),
        }
    }

    async fn act(
        behavior: MockBehavior,
        invocation: &BackendInvocation,
    ) -> Result<BackendOutput, BackendError> {
        let mut behavior = behavior;
        loop {
            match behavior {
                MockBehavior::Succeed { bytes, title } => {
                    let path = invocation
                        .output_dir
                        .join(format!("{}.mp4", invocation.profile.as_str()));
                    tokio::fs::write(&path, vec![0u8; bytes as usize]).await?;
                    return Ok(BackendOutput {
                        artifact: Some(path),
                        title,
                    });
                }
                MockBehavior::Fail { message } => {
                    return Err(BackendError::failed(message, Some(1)));
                }
                MockBehavior::PartialThenFail {
                    partial_bytes,
                    message,
                } => {
                    let path = invocation
                        .output_dir
                        .join(format!("{}.mp4.part", invocation.profile.as_str()));
                    tokio::fs::write(&path, vec![0u8; partial_bytes as usize]).await?;
                    return Err(BackendError::failed(message, Some(1)));
                }
                MockBehavior::Hang => return std::future::pending().await,
                MockBehavior::Delay { duration, then } => {
                    tokio::time::sleep(duration).await;
                    behavior = *then;
                }
                MockBehavior::NoArtifact => return Ok(BackendOutput::default()),
                MockBehavior::ReportPath(path) => {
                    return Ok(BackendOutput {
                        artifact: Some(path),
                        title: None,
                    });
                }
            }
        }
    }

    async fn describe(
        behavior: MockBehavior,
        invocation: &ProbeInvocation,
    ) -> Result<MediaInfo, BackendError> {
        let mut behavior = behavior;
        loop {
            match behavior {
                MockBehavior::Succeed { title, .. } => {
                    return Ok(MediaInfo {
                        id: Some(format!("mock-{}", invocation.profile)),
                        title,
                        ..Default::default()
                    });
                }
                MockBehavior::Fail { message }
                | MockBehavior::PartialThenFail { message, .. } => {
                    return Err(BackendError::failed(message, Some(1)));
                }
                MockBehavior::Hang => return std::future::pending().await,
                MockBehavior::Delay { duration, then } => {
                    tokio::time::sleep(duration).await;
                    behavior = *then;
                }
                MockBehavior::NoArtifact | MockBehavior::ReportPath(_) => {
                    return Err(BackendError::InvalidOutput {
                        message: "no metadata".to_string(),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl MediaBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, invocation: &BackendInvocation) -> Result<BackendOutput, BackendError> {
        self.invocations.write().await.push(invocation.clone());
        let behavior = self.behavior_for(invocation.profile).await;
        Self::act(behavior, invocation).await
    }

    async fn probe(&self, invocation: &ProbeInvocation) -> Result<MediaInfo, BackendError> {
        self.probes.write().await.push(invocation.clone());
        let behavior = self.behavior_for(invocation.profile).await;
        Self::describe(behavior, invocation).await
    }
}
