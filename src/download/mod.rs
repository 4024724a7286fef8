//! Media extraction: yt-dlp wrapper, temp file guard and errors

pub mod artifact;
pub mod error;
pub mod extractor;

// Re-exports for convenience
pub use artifact::TempArtifact;
pub use error::DownloadError;
pub use extractor::{MediaExtractor, MediaInfo, MediaKind, MediaPayload, YtDlpExtractor};
