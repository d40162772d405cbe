//! yt-dlp based backend implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::SystemTime;
use tokio::process::Command;
use tracing::{debug, warn};

use super::config::BackendConfig;
use super::error::BackendError;
use super::traits::MediaBackend;
use super::types::{BackendInvocation, BackendOutput, MediaInfo, ProbeInvocation};
use crate::platform::Platform;
use crate::strategy::ClientProfile;

const ANDROID_USER_AGENT: &str =
    "com.google.android.apps.youtube.music/5.16.51 (Linux; U; Android 11) gzip";
const IOS_USER_AGENT: &str =
    "com.google.ios.youtube/19.09.3 (iPhone14,3; U; CPU iOS 15_6 like Mac OS X; en_US)";
const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const TITLE_TEMPLATE: &str = "%(title).50s.%(ext)s";
const ID_TEMPLATE: &str = "%(id)s.%(ext)s";

/// Prefixes for the `--print` lines read back from stdout.
const FILE_MARKER: &str = "CLIPFETCH_FILE:";
const TITLE_MARKER: &str = "CLIPFETCH_TITLE:";

/// Leftovers yt-dlp writes while a download is in progress.
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl", ".tmp", ".temp"];

/// Backend that spawns `yt-dlp` once per attempt.
pub struct YtDlpBackend {
    config: BackendConfig,
}

impl YtDlpBackend {
    /// Creates a new yt-dlp backend with the given configuration.
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    /// Creates a backend with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(BackendConfig::default())
    }

    /// Builds yt-dlp arguments for one download.
    fn build_args(&self, inv: &BackendInvocation) -> Vec<String> {
        let limit_mb = (inv.max_bytes / (1024 * 1024)).max(1);
        let template = match inv.profile {
            ClientProfile::Minimal => ID_TEMPLATE,
            _ => TITLE_TEMPLATE,
        };

        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "--no-simulate".to_string(),
            "--print".to_string(),
            format!("after_move:{}%(filepath)s", FILE_MARKER),
            "--print".to_string(),
            format!("after_move:{}%(title)s", TITLE_MARKER),
            "-o".to_string(),
            inv.output_dir.join(template).to_string_lossy().to_string(),
            "-f".to_string(),
            format_selector(inv.profile, limit_mb),
        ];
        if inv.profile == ClientProfile::None {
            args.extend(["--merge-output-format".to_string(), "mp4".to_string()]);
        }
        if inv.post_process {
            args.extend(["--recode-video".to_string(), "mp4".to_string()]);
        }
        if let Some(ref location) = self.config.ffmpeg_location {
            args.extend([
                "--ffmpeg-location".to_string(),
                location.to_string_lossy().to_string(),
            ]);
        }

        self.finish_args(
            args,
            inv.profile,
            inv.platform,
            inv.credential_path.as_deref(),
            &inv.url,
        )
    }

    /// Builds yt-dlp arguments for a metadata-only lookup.
    fn build_probe_args(&self, inv: &ProbeInvocation) -> Vec<String> {
        let args = vec![
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        self.finish_args(
            args,
            inv.profile,
            inv.platform,
            inv.credential_path.as_deref(),
            &inv.url,
        )
    }

    /// Appends the settings shared by downloads and probes, then the URL.
    fn finish_args(
        &self,
        mut args: Vec<String>,
        profile: ClientProfile,
        platform: Platform,
        credential_path: Option<&Path>,
        url: &str,
    ) -> Vec<String> {
        args.extend([
            "--socket-timeout".to_string(),
            self.config.socket_timeout_secs.to_string(),
            "--retries".to_string(),
            self.config.retries.to_string(),
        ]);
        args.extend(client_args(profile, platform));

        if let Some(cookies) = credential_path {
            args.extend(["--cookies".to_string(), cookies.to_string_lossy().to_string()]);
        }

        args.extend(self.config.extra_args.iter().cloned());

        // Keep URLs starting with '-' from being read as options.
        args.push("--".to_string());
        args.push(url.to_string());

        args
    }

    /// Reads the marked path and title lines from stdout.
    ///
    /// Only lines carrying a marker count. The title is platform-controlled
    /// and is never taken as a path.
    fn parse_printed(stdout: &str) -> (Option<PathBuf>, Option<String>) {
        let mut path = None;
        let mut title = None;
        for line in stdout.lines() {
            if let Some(rest) = line.strip_prefix(FILE_MARKER) {
                let rest = rest.trim();
                if !rest.is_empty() {
                    path = Some(PathBuf::from(rest));
                }
            } else if let Some(rest) = line.strip_prefix(TITLE_MARKER) {
                let rest = rest.trim();
                if !rest.is_empty() {
                    title = Some(rest.to_string());
                }
            }
        }
        (path, title)
    }

    fn parse_info(stdout: &str) -> Result<MediaInfo, BackendError> {
        serde_json::from_str(stdout.trim()).map_err(|e| BackendError::InvalidOutput {
            message: e.to_string(),
        })
    }

    async fn run(&self, args: &[String]) -> Result<String, BackendError> {
        // Dropping this future (deadline, cancellation) kills the process.
        let child = Command::new(&self.config.ytdlp_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                stdout
            } else {
                stderr.to_string()
            };
            return Err(BackendError::failed(message, output.status.code()));
        }

        Ok(stdout)
    }

    fn spawn_error(&self, e: std::io::Error) -> BackendError {
        if e.kind() == std::io::ErrorKind::NotFound {
            BackendError::ExecutableNotFound {
                path: self.config.ytdlp_path.clone(),
            }
        } else {
            BackendError::Io(e)
        }
    }
}

fn format_selector(profile: ClientProfile, limit_mb: u64) -> String {
    match profile {
        ClientProfile::None => {
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string()
        }
        ClientProfile::MobileA => format!("best[height<=720][filesize<{}M]/worst", limit_mb),
        ClientProfile::MobileB => format!("best[height<=480][filesize<{}M]/worst", limit_mb),
        ClientProfile::GeneralWeb => format!("worst[filesize<{}M]/worst", limit_mb),
        ClientProfile::Minimal => "worst".to_string(),
    }
}

/// Client fingerprint arguments for a profile.
fn client_args(profile: ClientProfile, platform: Platform) -> Vec<String> {
    let mut args = Vec::new();
    match profile {
        ClientProfile::None => {}
        ClientProfile::MobileA => {
            args.extend([
                "--extractor-args".to_string(),
                "youtube:player_client=android_music,android;skip=dash,hls".to_string(),
                "--user-agent".to_string(),
                ANDROID_USER_AGENT.to_string(),
                "--add-header".to_string(),
                "X-YouTube-Client-Name:21".to_string(),
                "--add-header".to_string(),
                "X-YouTube-Client-Version:5.16.51".to_string(),
            ]);
        }
        ClientProfile::MobileB => {
            args.extend([
                "--extractor-args".to_string(),
                "youtube:player_client=ios".to_string(),
                "--user-agent".to_string(),
                IOS_USER_AGENT.to_string(),
                "--add-header".to_string(),
                "X-YouTube-Client-Name:5".to_string(),
                "--add-header".to_string(),
                "X-YouTube-Client-Version:19.09.3".to_string(),
            ]);
        }
        ClientProfile::GeneralWeb => {
            args.extend([
                "--user-agent".to_string(),
                DESKTOP_USER_AGENT.to_string(),
                "--add-header".to_string(),
                "Accept:*/*".to_string(),
                "--add-header".to_string(),
                "Accept-Language:en-US,en;q=0.9".to_string(),
            ]);
            if platform == Platform::YouTube {
                args.extend([
                    "--add-header".to_string(),
                    "Origin:https://www.youtube.com".to_string(),
                    "--referer".to_string(),
                    "https://www.youtube.com/".to_string(),
                ]);
            }
        }
        ClientProfile::Minimal => args.push("--no-color".to_string()),
    }
    args
}

/// Newest finished media file in `dir`, ignoring partial and hidden files.
pub(crate) async fn newest_media_file(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut best: Option<(PathBuf, SystemTime)> = None;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.starts_with('.') || PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            continue;
        }

        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        match &best {
            Some((_, best_time)) if modified <= *best_time => {}
            _ => best = Some((path, modified)),
        }
    }

    Ok(best.map(|(path, _)| path))
}

#[async_trait]
impl MediaBackend for YtDlpBackend {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(&self, invocation: &BackendInvocation) -> Result<BackendOutput, BackendError> {
        let args = self.build_args(invocation);
        debug!(
            "Running {:?} with profile {} for {}",
            self.config.ytdlp_path, invocation.profile, invocation.url
        );

        let stdout = self.run(&args).await?;
        let (printed, title) = Self::parse_printed(&stdout);
        let artifact = match printed {
            Some(path) => Some(path),
            None => {
                warn!(
                    "yt-dlp did not report a file path, scanning {:?}",
                    invocation.output_dir
                );
                newest_media_file(&invocation.output_dir).await?
            }
        };

        Ok(BackendOutput { artifact, title })
    }

    async fn probe(&self, invocation: &ProbeInvocation) -> Result<MediaInfo, BackendError> {
        let args = self.build_probe_args(invocation);
        debug!(
            "Probing {} with profile {}",
            invocation.url, invocation.profile
        );
        let stdout = self.run(&args).await?;
        Self::parse_info(&stdout)
    }

    async fn validate(&self) -> Result<(), BackendError> {
        let output = Command::new(&self.config.ytdlp_path)
            .arg("--version")
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(BackendError::failed(
                String::from_utf8_lossy(&output.stderr).to_string(),
                output.status.code(),
            ));
        }

        debug!(
            "yt-dlp version {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn invocation(profile: ClientProfile) -> BackendInvocation {
        BackendInvocation {
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            platform: Platform::YouTube,
            profile,
            credential_path: None,
            output_dir: PathBuf::from("/tmp/scope"),
            post_process: false,
            max_bytes: 50 * 1024 * 1024,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_credentialed_args() {
        let backend = YtDlpBackend::with_defaults();
        let mut inv = invocation(ClientProfile::None);
        inv.credential_path = Some(PathBuf::from("/etc/clipfetch/cookies.txt"));
        inv.post_process = true;

        let args = backend.build_args(&inv);
        assert_eq!(
            value_after(&args, "-f"),
            Some("bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best")
        );
        assert_eq!(
            value_after(&args, "--cookies"),
            Some("/etc/clipfetch/cookies.txt")
        );
        assert_eq!(value_after(&args, "--recode-video"), Some("mp4"));
        assert_eq!(
            value_after(&args, "-o"),
            Some("/tmp/scope/%(title).50s.%(ext)s")
        );
    }

    #[test]
    fn test_mobile_args_use_size_filter() {
        let backend = YtDlpBackend::with_defaults();

        let args = backend.build_args(&invocation(ClientProfile::MobileA));
        assert_eq!(
            value_after(&args, "-f"),
            Some("best[height<=720][filesize<50M]/worst")
        );
        assert!(args.contains(&"X-YouTube-Client-Name:21".to_string()));
        assert!(!args.contains(&"--cookies".to_string()));

        let args = backend.build_args(&invocation(ClientProfile::MobileB));
        assert_eq!(
            value_after(&args, "--extractor-args"),
            Some("youtube:player_client=ios")
        );
    }

    #[test]
    fn test_web_headers_only_reference_youtube_for_youtube() {
        let backend = YtDlpBackend::with_defaults();
        let args = backend.build_args(&invocation(ClientProfile::GeneralWeb));
        assert!(args.contains(&"Origin:https://www.youtube.com".to_string()));

        let mut inv = invocation(ClientProfile::GeneralWeb);
        inv.platform = Platform::TikTok;
        let args = backend.build_args(&inv);
        assert!(!args.contains(&"Origin:https://www.youtube.com".to_string()));
    }

    #[test]
    fn test_minimal_args_and_url_last() {
        let backend = YtDlpBackend::new(BackendConfig {
            extra_args: vec!["--geo-bypass".to_string()],
            ..Default::default()
        });
        let args = backend.build_args(&invocation(ClientProfile::Minimal));
        assert_eq!(value_after(&args, "-f"), Some("worst"));
        assert_eq!(value_after(&args, "-o"), Some("/tmp/scope/%(id)s.%(ext)s"));
        assert!(args.contains(&"--geo-bypass".to_string()));
        let n = args.len();
        assert_eq!(args[n - 2], "--");
        assert_eq!(args[n - 1], "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_parse_printed() {
        let stdout = "[download] Destination: /tmp/scope/clip.mp4\n\
                      CLIPFETCH_FILE:/tmp/scope/clip.mp4\n\
                      CLIPFETCH_TITLE:Some Title\n";
        let (path, title) = YtDlpBackend::parse_printed(stdout);
        assert_eq!(path, Some(PathBuf::from("/tmp/scope/clip.mp4")));
        assert_eq!(title.as_deref(), Some("Some Title"));

        let (path, title) = YtDlpBackend::parse_printed("Title\n");
        assert!(path.is_none());
        assert!(title.is_none());
    }

    #[test]
    fn test_title_naming_a_host_file_is_not_the_artifact() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("clip.mp4");
        std::fs::write(&file, b"data").unwrap();
        let host = std::env::temp_dir();

        let stdout = format!(
            "{}{}\n{}{}\n{}\n",
            FILE_MARKER,
            file.display(),
            TITLE_MARKER,
            host.display(),
            host.display()
        );
        let (path, title) = YtDlpBackend::parse_printed(&stdout);
        assert_eq!(path, Some(file));
        assert_eq!(title, Some(host.display().to_string()));
    }

    #[test]
    fn test_download_prints_marked_lines() {
        let backend = YtDlpBackend::with_defaults();
        let args = backend.build_args(&invocation(ClientProfile::GeneralWeb));
        let printed: Vec<&str> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| a.as_str() == "--print")
            .filter_map(|(i, _)| args.get(i + 1).map(String::as_str))
            .collect();
        assert_eq!(
            printed,
            vec![
                "after_move:CLIPFETCH_FILE:%(filepath)s",
                "after_move:CLIPFETCH_TITLE:%(title)s"
            ]
        );
    }

    #[test]
    fn test_probe_args() {
        let backend = YtDlpBackend::with_defaults();
        let inv = ProbeInvocation {
            url: "https://www.instagram.com/reel/Cx1/".to_string(),
            platform: Platform::Instagram,
            profile: ClientProfile::GeneralWeb,
            credential_path: Some(PathBuf::from("/etc/clipfetch/cookies.txt")),
        };
        let args = backend.build_probe_args(&inv);
        assert!(args.contains(&"--dump-single-json".to_string()));
        assert!(args.contains(&"--skip-download".to_string()));
        assert!(!args.contains(&"-o".to_string()));
        assert!(!args.contains(&"-f".to_string()));
        assert_eq!(value_after(&args, "--user-agent"), Some(DESKTOP_USER_AGENT));
        assert_eq!(
            value_after(&args, "--cookies"),
            Some("/etc/clipfetch/cookies.txt")
        );
        assert_eq!(
            args.last().map(String::as_str),
            Some("https://www.instagram.com/reel/Cx1/")
        );
    }

    #[test]
    fn test_parse_info() {
        let json = r#"{"id":"dQw4w9WgXcQ","title":"Never Gonna","duration":212,
            "uploader":"Rick","view_count":null,"formats":[]}"#;
        let info = YtDlpBackend::parse_info(json).unwrap();
        assert_eq!(info.id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(info.title.as_deref(), Some("Never Gonna"));
        assert_eq!(info.duration, Some(212.0));
        assert_eq!(info.uploader.as_deref(), Some("Rick"));
        assert_eq!(info.view_count, None);

        assert!(matches!(
            YtDlpBackend::parse_info("not json"),
            Err(BackendError::InvalidOutput { .. })
        ));
    }

    #[tokio::test]
    async fn test_newest_media_file_skips_partials() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("clip.mp4.part"), b"partial").unwrap();
        std::fs::write(dir.path().join(".hidden"), b"x").unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"done").unwrap();

        let found = newest_media_file(dir.path()).await.unwrap();
        assert_eq!(found, Some(dir.path().join("clip.mp4")));
    }

    #[tokio::test]
    async fn test_newest_media_file_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(newest_media_file(dir.path()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let backend = YtDlpBackend::new(BackendConfig::with_path(PathBuf::from(
            "/nonexistent/bin/yt-dlp",
        )));
        assert!(matches!(
            backend.validate().await,
            Err(BackendError::ExecutableNotFound { .. })
        ));
        assert!(matches!(
            backend.fetch(&invocation(ClientProfile::Minimal)).await,
            Err(BackendError::ExecutableNotFound { .. })
        ));
        let probe = ProbeInvocation {
            url: "https://youtu.be/abc".to_string(),
            platform: Platform::YouTube,
            profile: ClientProfile::Minimal,
            credential_path: None,
        };
        assert!(matches!(
            backend.probe(&probe).await,
            Err(BackendError::ExecutableNotFound { .. })
        ));
    }
}
