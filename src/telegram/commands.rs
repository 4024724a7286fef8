//! User-facing commands: /start, /help, /language and the language picker

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MaybeInaccessibleMessage};

use crate::i18n::{t, Language, MessageKey};
use crate::telegram::handlers::{user_id_of, HandlerDeps, HandlerError};
use strum::IntoEnumIterator;

/// One button per supported language, all on a single row.
pub fn language_keyboard() -> InlineKeyboardMarkup {
    let row: Vec<InlineKeyboardButton> = Language::iter()
        .map(|lang| InlineKeyboardButton::callback(lang.label(), lang.callback_data()))
        .collect();
    InlineKeyboardMarkup::new(vec![row])
}

/// Text shown once a language has been picked.
pub fn welcome_text(lang: Language) -> String {
    format!("{}\n\n{}", t(lang, MessageKey::Welcome), t(lang, MessageKey::Start))
}

/// Handle /start command
///
/// Registers the user on first contact and shows the bilingual language picker.
pub async fn handle_start(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    if let Some(user_id) = msg.from.as_ref().and_then(user_id_of) {
        deps.users.register(user_id).await?;
    }

    bot.send_message(msg.chat.id, t(deps.users.default_language(), MessageKey::LanguagePrompt))
        .reply_markup(language_keyboard())
        .await?;
    Ok(())
}

pub async fn handle_help(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let lang = sender_language(msg, deps).await;
    bot.send_message(msg.chat.id, t(lang, MessageKey::Help)).await?;
    Ok(())
}

pub async fn handle_language(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let lang = sender_language(msg, deps).await;
    bot.send_message(msg.chat.id, t(lang, MessageKey::SelectLang))
        .reply_markup(language_keyboard())
        .await?;
    Ok(())
}

/// Handles a `lang_<code>` button press.
pub async fn handle_language_callback(bot: &Bot, q: &CallbackQuery, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(lang) = q.data.as_deref().and_then(Language::from_callback_data) else {
        log::warn!("Ignoring callback with unexpected data {:?}", q.data);
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let Some(user_id) = user_id_of(&q.from) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    deps.users.set_language(user_id, lang).await?;
    log::info!("User {} switched language to {}", user_id, lang);

    bot.answer_callback_query(q.id.clone())
        .text(t(lang, MessageKey::LangSet))
        .await?;

    match &q.message {
        Some(MaybeInaccessibleMessage::Regular(message)) => {
            bot.edit_message_text(message.chat.id, message.id, welcome_text(lang))
                .await?;
        }
        _ => {
            bot.send_message(q.from.id, welcome_text(lang)).await?;
        }
    }
    Ok(())
}

/// Stored language of the message sender, or the default.
pub async fn sender_language(msg: &Message, deps: &HandlerDeps) -> Language {
    match msg.from.as_ref().and_then(user_id_of) {
        Some(user_id) => deps.users.get_language(user_id).await,
        None => deps.users.default_language(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_offers_every_language() {
        let keyboard = language_keyboard();
        assert_eq!(keyboard.inline_keyboard.len(), 1);
        assert_eq!(keyboard.inline_keyboard[0].len(), Language::iter().count());
        assert_eq!(keyboard.inline_keyboard[0][0].text, "English 🇬🇧");
    }

    #[test]
    fn welcome_combines_greeting_and_instructions() {
        let text = welcome_text(Language::En);
        assert!(text.starts_with(&t(Language::En, MessageKey::Welcome)));
        assert!(text.ends_with(&t(Language::En, MessageKey::Start)));
    }
}
