use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::i18n::Language;

/// Version written into a freshly initialized data file
pub const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reads `key` and parses it, falling back to `default` when unset or malformed
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid {}={:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Bot token
/// Read from TOKEN, BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("TOKEN")
        .or_else(|_| env::var("BOT_TOKEN"))
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_default()
});

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: bot.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "bot.log".to_string()));

/// Log level (error, warn, info, debug, trace)
/// Read from LOG_LEVEL environment variable
pub static LOG_LEVEL: Lazy<log::LevelFilter> = Lazy::new(|| env_parse("LOG_LEVEL", log::LevelFilter::Info));

/// Language for users who never picked one
/// Read from DEFAULT_LANGUAGE environment variable
pub static DEFAULT_LANGUAGE: Lazy<Language> = Lazy::new(|| {
    env::var("DEFAULT_LANGUAGE")
        .ok()
        .and_then(|code| Language::from_code(&code))
        .unwrap_or_default()
});

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Directory for in-flight downloads
/// Read from TEMP_FILES_DIR environment variable, supports tilde (~) expansion
/// Defaults to the system temp dir
pub static TEMP_FILES_DIR: Lazy<String> = Lazy::new(|| match env::var("TEMP_FILES_DIR") {
    Ok(dir) => shellexpand::tilde(&dir).into_owned(),
    Err(_) => env::temp_dir().to_string_lossy().into_owned(),
});

/// Data file configuration
pub mod store {
    use once_cell::sync::Lazy;
    use std::env;

    /// JSON data file path
    /// Read from DATA_FILE environment variable, supports tilde (~) expansion
    /// Default: bot_data.json
    pub static DATA_FILE: Lazy<String> = Lazy::new(|| {
        let raw = env::var("DATA_FILE").unwrap_or_else(|_| "bot_data.json".to_string());
        shellexpand::tilde(&raw).into_owned()
    });
}

/// Download configuration
pub mod download {
    use super::{env_parse, Duration};
    use once_cell::sync::Lazy;

    /// Longest video accepted (in seconds)
    pub static MAX_DURATION_SECS: Lazy<u64> = Lazy::new(|| env_parse("MAX_MEDIA_DURATION_SECS", 600));

    /// Timeout for each yt-dlp invocation (in seconds)
    pub static YTDLP_TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| env_parse("YTDLP_TIMEOUT_SECS", 300));

    /// Desktop browser User-Agent sent for Instagram links
    pub const INSTAGRAM_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

    pub fn max_duration() -> Duration {
        Duration::from_secs(*MAX_DURATION_SECS)
    }

    /// yt-dlp command timeout duration
    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(*YTDLP_TIMEOUT_SECS)
    }
}

/// Broadcast pacing
pub mod broadcast {
    use super::{env_parse, Duration};
    use once_cell::sync::Lazy;

    /// Pause between two recipients (milliseconds)
    pub static DELAY_MS: Lazy<u64> = Lazy::new(|| env_parse("BROADCAST_DELAY_MS", 100));

    /// Upper bound for a single send (seconds)
    pub static SEND_TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| env_parse("BROADCAST_SEND_TIMEOUT_SECS", 10));

    pub fn delay() -> Duration {
        Duration::from_millis(*DELAY_MS)
    }

    pub fn send_timeout() -> Duration {
        Duration::from_secs(*SEND_TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for HTTP requests (in seconds)
    /// Large enough for video uploads of the maximum accepted duration
    pub const REQUEST_TIMEOUT_SECS: u64 = 600;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Admin configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    pub(crate) fn parse_admin_ids(raw: &str) -> Vec<i64> {
        raw.split([',', ' ', '\n', '\t'])
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    }

    /// Admin user IDs
    /// Read from ADMIN_IDS (comma-separated) plus the single ADMIN_CHAT_ID
    pub static ADMIN_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
        let mut ids = env::var("ADMIN_IDS")
            .ok()
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default();
        if let Some(id) = env::var("ADMIN_CHAT_ID").ok().and_then(|raw| raw.trim().parse().ok()) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    });
}

/// Input validation limits
pub mod validation {
    /// Longest URL accepted from a chat message
    pub const MAX_URL_LENGTH: usize = 2048;
}

/// Custom Bot API server
pub mod bot_api {
    /// Returns the BOT_API_URL environment variable if set.
    pub fn get_url() -> Option<String> {
        std::env::var("BOT_API_URL").ok().filter(|url| !url.trim().is_empty())
    }
}
