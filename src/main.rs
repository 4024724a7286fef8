use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;

use mediagrab::cli::{self, Cli, Commands};
use mediagrab::core::logging::install_panic_hook;
use mediagrab::core::{config, init_logger, BroadcastOptions};
use mediagrab::download::{MediaExtractor, YtDlpExtractor};
use mediagrab::i18n;
use mediagrab::storage::{RecordStore, UserDirectory};
use mediagrab::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, data file, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse_args();

    // Load environment variables from .env if present, before any config is read
    let _ = dotenv();

    install_panic_hook();
    init_logger(&config::LOG_FILE_PATH, *config::LOG_LEVEL)?;

    match args.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::Stats { json }) => {
            print!("{}", cli::stats_report(data_file().as_path(), json).await?);
            Ok(())
        }
        Some(Commands::User { id }) => {
            print!("{}", cli::user_report(data_file().as_path(), id).await?);
            Ok(())
        }
        Some(Commands::CheckLocales) => {
            i18n::validate_catalog()?;
            println!("All messages are translated for every language");
            Ok(())
        }
    }
}

/// Starts long polling and serves updates until Ctrl+C.
async fn run_bot() -> Result<()> {
    log::info!("Starting mediagrab {}", config::BUILD_VERSION);

    i18n::validate_catalog()?;

    let token = config::BOT_TOKEN.as_str();
    if token.is_empty() {
        anyhow::bail!("Bot token is not set (TOKEN, BOT_TOKEN or TELOXIDE_TOKEN)");
    }

    let store = Arc::new(RecordStore::open(config::store::DATA_FILE.as_str()).await?);
    let users = UserDirectory::new(Arc::clone(&store), *config::DEFAULT_LANGUAGE);
    let extractor: Arc<dyn MediaExtractor> = Arc::new(YtDlpExtractor::from_config());

    if config::admin::ADMIN_IDS.is_empty() {
        log::warn!("No admin ids configured (ADMIN_IDS / ADMIN_CHAT_ID); admin commands are disabled");
    }

    let deps = HandlerDeps::new(
        store,
        users,
        extractor,
        BroadcastOptions::from_config(),
        PathBuf::from(config::TEMP_FILES_DIR.as_str()),
        config::admin::ADMIN_IDS.clone(),
    );

    let bot = create_bot(token)?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

fn data_file() -> PathBuf {
    PathBuf::from(config::store::DATA_FILE.as_str())
}
