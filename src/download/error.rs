use std::time::Duration;

use thiserror::Error;

use crate::i18n::MessageKey;

/// Structured error type for media extraction.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// yt-dlp ran but reported a failure (unsupported site, private post, ...)
    #[error("yt-dlp failed: {0}")]
    YtDlp(String),

    /// Media is longer than the configured maximum
    #[error("media lasts {actual}s, limit is {max}s")]
    DurationExceeded { actual: u64, max: u64 },

    /// yt-dlp did not finish in time and was killed
    #[error("yt-dlp timed out after {0:?}")]
    Timeout(Duration),

    /// yt-dlp exited successfully but left no file behind
    #[error("downloaded file not found: {0}")]
    FileNotFound(String),

    /// Spawning the process or touching the temp directory failed
    #[error("process error: {0}")]
    Process(#[from] std::io::Error),

    /// The metadata probe printed something that is not yt-dlp JSON
    #[error("unreadable yt-dlp metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl DownloadError {
    /// Message shown to the user for this failure.
    pub fn message_key(&self) -> MessageKey {
        match self {
            DownloadError::DurationExceeded { .. } => MessageKey::DurationExceeded,
            _ => MessageKey::Error,
        }
    }

    /// Returns subcategory for logs
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::YtDlp(_) => "ytdlp",
            DownloadError::DurationExceeded { .. } => "duration",
            DownloadError::Timeout(_) => "timeout",
            DownloadError::FileNotFound(_) => "file_not_found",
            DownloadError::Process(_) => "process",
            DownloadError::Metadata(_) => "metadata",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_has_its_own_message() {
        let err = DownloadError::DurationExceeded { actual: 900, max: 600 };
        assert_eq!(err.message_key(), MessageKey::DurationExceeded);
        assert_eq!(err.to_string(), "media lasts 900s, limit is 600s");
    }

    #[test]
    fn other_failures_are_generic() {
        assert_eq!(
            DownloadError::YtDlp("ERROR: Unsupported URL".into()).message_key(),
            MessageKey::Error
        );
        assert_eq!(
            DownloadError::Timeout(Duration::from_secs(5)).message_key(),
            MessageKey::Error
        );
        assert_eq!(DownloadError::FileNotFound("x".into()).subcategory(), "file_not_found");
    }
}
