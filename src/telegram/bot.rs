//! Bot initialization and command definitions
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Command menu registration

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::{BotCommands, ParseError};

use crate::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "start using the bot")]
    Start,
    #[command(description = "show help")]
    Help,
    #[command(description = "change language")]
    Language,
    #[command(description = "bot statistics (admins only)")]
    Stats,
    #[command(description = "message every user (admins only)", parse_with = rest_of_line)]
    Broadcast(String),
    #[command(description = "stop the running broadcast (admins only)")]
    Cancelbroadcast,
    #[command(description = "look up a user (admins only)", parse_with = rest_of_line)]
    Userinfo(String),
}

/// Takes everything after the command verbatim; an empty rest is allowed so
/// the handler can answer with usage help.
fn rest_of_line(input: String) -> Result<(String,), ParseError> {
    Ok((input.trim().to_string(),))
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to create bot (invalid URL, HTTP client setup)
pub fn create_bot(token: &str) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(token, client);

    let bot = match config::bot_api::get_url() {
        Some(bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            let url = url::Url::parse(&bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            bot.set_api_url(url)
        }
        None => bot,
    };

    Ok(bot)
}

/// Commands shown in the Telegram menu. Admin commands stay hidden.
pub fn public_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Start using the bot"),
        BotCommand::new("help", "Show help"),
        BotCommand::new("language", "Change language / تغيير اللغة"),
    ]
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(public_commands()).await?;
    Ok(())
}
