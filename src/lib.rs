//! Mediagrab - Telegram bot that downloads videos and images from links
//!
//! Users send a link, the bot fetches the media with yt-dlp and sends it
//! back. Per-user language choices and download counters live in a single
//! JSON data file guarded by an in-process lock.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, statistics, admin queries, broadcast
//! - `storage`: data model, record store and user directory
//! - `download`: yt-dlp extractor and temporary file handling
//! - `telegram`: Telegram bot integration and handlers
//! - `i18n`: supported languages and the message catalog

pub mod cli;
pub mod core;
pub mod download;
pub mod i18n;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use i18n::{Language, MessageKey};
pub use storage::{RecordStore, Store, UserDirectory, UserRecord};
