//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{HandlerDeps, HandlerError};
use crate::i18n::LANG_CALLBACK_PREFIX;
use crate::telegram::admin::{handle_broadcast, handle_cancel_broadcast, handle_stats, handle_userinfo};
use crate::telegram::bot::Command;
use crate::telegram::commands::{handle_help, handle_language, handle_language_callback, handle_start};
use crate::telegram::downloads::handle_media_request;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// The same tree is used in production and by tests that drive the bot
/// with synthetic updates.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
        .branch(callback_handler(deps_callback))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start => handle_start(&bot, &msg, &deps).await,
                    Command::Help => handle_help(&bot, &msg, &deps).await,
                    Command::Language => handle_language(&bot, &msg, &deps).await,
                    Command::Stats => handle_stats(&bot, &msg, &deps).await,
                    Command::Broadcast(text) => handle_broadcast(&bot, &msg, &deps, text).await,
                    Command::Cancelbroadcast => handle_cancel_broadcast(&bot, &msg, &deps).await,
                    Command::Userinfo(arg) => handle_userinfo(&bot, &msg, &deps, arg).await,
                }
            }
        },
    ))
}

/// Plain text that is not a command is treated as a media link.
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some_and(|text| !text.starts_with('/')))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move { handle_media_request(&bot, &msg, &deps).await }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query()
        .filter(|q: CallbackQuery| {
            q.data
                .as_deref()
                .is_some_and(|data| data.starts_with(LANG_CALLBACK_PREFIX))
        })
        .endpoint(move |bot: Bot, q: CallbackQuery| {
            let deps = deps.clone();
            async move { handle_language_callback(&bot, &q, &deps).await }
        })
}
