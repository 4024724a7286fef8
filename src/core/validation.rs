//! Validation of chat input before it reaches the extractor
//!
//! Only absolute `http`/`https` URLs with a host are handed to yt-dlp;
//! anything else (bare words, `file://`, `javascript:` ...) is rejected here.

use thiserror::Error;
use url::Url;

use crate::core::config::validation::MAX_URL_LENGTH;

/// Validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Not parseable as an absolute URL, or no host
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Parsed fine but uses a scheme other than http(s)
    #[error("Unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("URL is {0} characters long, limit is {max}", max = MAX_URL_LENGTH)]
    TooLong(usize),
}

/// Validates a media link sent by a user.
///
/// Surrounding whitespace is ignored.
///
/// # Examples
/// ```
/// use mediagrab::core::validation::validate_media_url;
///
/// assert!(validate_media_url("https://www.instagram.com/p/abc/").is_ok());
/// assert!(validate_media_url("ftp://example.com/video").is_err());
/// assert!(validate_media_url("hello").is_err());
/// ```
pub fn validate_media_url(text: &str) -> Result<Url, ValidationError> {
    let text = text.trim();

    let length = text.chars().count();
    if length > MAX_URL_LENGTH {
        return Err(ValidationError::TooLong(length));
    }

    let parsed = Url::parse(text).map_err(|_| ValidationError::InvalidUrl(text.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::InvalidUrl(format!("{} (no host)", text)));
    }

    Ok(parsed)
}
