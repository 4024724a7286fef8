//! Media extraction through yt-dlp
//!
//! Extraction runs in two steps: a metadata probe (`-J --skip-download`)
//! that enforces the duration limit before anything is fetched, then the
//! actual download into a [`TempArtifact`].

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use url::Url;

use super::artifact::TempArtifact;
use super::error::DownloadError;
use crate::core::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Anything with a positive duration is a video.
    pub fn from_duration(duration: Option<f64>) -> Self {
        match duration {
            Some(secs) if secs > 0.0 => MediaKind::Video,
            _ => MediaKind::Image,
        }
    }
}

/// Subset of the yt-dlp info JSON the bot cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub ext: Option<String>,
}

impl MediaInfo {
    pub fn kind(&self) -> MediaKind {
        MediaKind::from_duration(self.duration)
    }

    /// Rejects media longer than `max`.
    pub fn check_duration(&self, max: Duration) -> Result<(), DownloadError> {
        let Some(secs) = self.duration.filter(|d| d.is_finite() && *d > 0.0) else {
            return Ok(());
        };
        let actual = secs.ceil() as u64;
        if actual > max.as_secs() {
            return Err(DownloadError::DurationExceeded {
                actual,
                max: max.as_secs(),
            });
        }
        Ok(())
    }
}

/// A downloaded file ready to be relayed.
#[derive(Debug, Clone)]
pub struct MediaPayload {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub title: Option<String>,
    pub duration_secs: Option<u32>,
}

/// Turns a URL into a local media file.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Downloads `url` into `artifact`. The artifact owns every file the
    /// extractor creates, so the caller's guard cleans up on any outcome.
    async fn extract(&self, url: &Url, artifact: &TempArtifact) -> Result<MediaPayload, DownloadError>;
}

pub struct YtDlpExtractor {
    bin: String,
    max_duration: Duration,
    timeout: Duration,
}

impl YtDlpExtractor {
    pub fn new(bin: impl Into<String>, max_duration: Duration, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            max_duration,
            timeout,
        }
    }

    pub fn from_config() -> Self {
        Self::new(
            config::YTDL_BIN.as_str(),
            config::download::max_duration(),
            config::download::ytdlp_timeout(),
        )
    }

    fn common_args(url: &Url) -> Vec<String> {
        let mut args = vec!["--no-playlist".to_string(), "--no-warnings".to_string()];
        if is_instagram(url) {
            args.push("--user-agent".to_string());
            args.push(config::download::INSTAGRAM_USER_AGENT.to_string());
        }
        args
    }

    fn probe_args(url: &Url) -> Vec<String> {
        let mut args = Self::common_args(url);
        args.extend(["-J".to_string(), "--skip-download".to_string(), url.to_string()]);
        args
    }

    fn download_args(url: &Url, artifact: &TempArtifact) -> Vec<String> {
        let mut args = Self::common_args(url);
        args.extend([
            "-f".to_string(),
            "best".to_string(),
            "-o".to_string(),
            artifact.output_template(),
            url.to_string(),
        ]);
        args
    }

    async fn run(&self, args: &[String]) -> Result<Output, DownloadError> {
        log::debug!("Running {} {}", self.bin, args.join(" "));

        let output = timeout(
            self.timeout,
            Command::new(&self.bin)
                .args(args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            log::error!("yt-dlp command timed out after {} seconds", self.timeout.as_secs());
            DownloadError::Timeout(self.timeout)
        })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::error!("yt-dlp exited with {}: {}", output.status, stderr.trim());
            return Err(DownloadError::YtDlp(summarize_stderr(&stderr)));
        }
        Ok(output)
    }

    pub async fn probe(&self, url: &Url) -> Result<MediaInfo, DownloadError> {
        let output = self.run(&Self::probe_args(url)).await?;
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn extract(&self, url: &Url, artifact: &TempArtifact) -> Result<MediaPayload, DownloadError> {
        let info = self.probe(url).await?;
        info.check_duration(self.max_duration)?;

        fs_err::tokio::create_dir_all(artifact.dir()).await?;
        self.run(&Self::download_args(url, artifact)).await?;

        let path = artifact
            .find_file()
            .ok_or_else(|| DownloadError::FileNotFound(artifact.output_template()))?;

        log::info!(
            "Downloaded {} ({:?}, {:?}s) to {}",
            url,
            info.kind(),
            info.duration,
            path.display()
        );

        Ok(MediaPayload {
            path,
            kind: info.kind(),
            title: info.title.clone(),
            duration_secs: info.duration.map(|d| d.round() as u32),
        })
    }
}

fn is_instagram(url: &Url) -> bool {
    url.host_str()
        .map(|host| host == "instagram.com" || host.ends_with(".instagram.com"))
        .unwrap_or(false)
}

/// The most useful single line of yt-dlp's stderr.
fn summarize_stderr(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
        .unwrap_or_else(|| "no error output".to_string())
}
