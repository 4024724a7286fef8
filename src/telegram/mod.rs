//! Telegram bot integration and handlers

pub mod admin;
pub mod bot;
pub mod commands;
pub mod downloads;
pub mod handlers;
pub mod notifier;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use notifier::TelegramNotifier;
pub use teloxide::Bot;
