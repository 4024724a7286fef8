//! Link message flow: validate, extract, relay, count
//!
//! The temporary artifact lives in this function's scope, so its files are
//! removed after the upload finished or failed, and also when the handler
//! future is dropped mid-way.

use teloxide::prelude::*;
use teloxide::types::InputFile;
use thiserror::Error;
use url::Url;

use crate::core::validation::validate_media_url;
use crate::download::{DownloadError, MediaExtractor, MediaKind, TempArtifact};
use crate::i18n::{t, t_count, Language, MessageKey};
use crate::storage::DownloadOutcome;
use crate::telegram::handlers::{user_id_of, HandlerDeps, HandlerError};

#[derive(Debug, Error)]
enum DeliveryError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("upload failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

impl DeliveryError {
    fn user_message(&self, lang: Language) -> String {
        match self {
            DeliveryError::Download(DownloadError::DurationExceeded { max, .. }) => {
                t_count(lang, MessageKey::DurationExceeded, *max)
            }
            DeliveryError::Download(e) => t(lang, e.message_key()),
            DeliveryError::Telegram(_) => t(lang, MessageKey::Error),
        }
    }

    fn subcategory(&self) -> &'static str {
        match self {
            DeliveryError::Download(e) => e.subcategory(),
            DeliveryError::Telegram(_) => "upload",
        }
    }
}

/// Handles a free-text message that should contain a media link.
pub async fn handle_media_request(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;
    let user_id = msg.from.as_ref().and_then(user_id_of);
    let lang = match user_id {
        Some(id) => deps.users.get_language(id).await,
        None => deps.users.default_language(),
    };

    let url = match validate_media_url(text) {
        Ok(url) => url,
        Err(e) => {
            log::debug!("Rejected message from chat {}: {}", chat_id, e);
            bot.send_message(chat_id, t(lang, MessageKey::InvalidUrl)).await?;
            return Ok(());
        }
    };

    if let Some(id) = user_id {
        deps.users.register(id).await?;
    }

    log::info!("Download request from user {:?}: {}", user_id, url);
    let progress = bot.send_message(chat_id, t(lang, MessageKey::Downloading)).await?;

    let result = {
        let artifact = TempArtifact::new(&deps.temp_dir);
        deliver(bot, chat_id, &url, &artifact, deps.extractor.as_ref(), lang).await
    };

    if let Err(e) = bot.delete_message(chat_id, progress.id).await {
        log::warn!("Failed to delete progress message in chat {}: {}", chat_id, e);
    }

    match result {
        Ok(()) => {
            if let Some(id) = user_id {
                match deps.users.record_download(id, lang).await? {
                    DownloadOutcome::Recorded { user_downloads } => {
                        log::info!("User {} now has {} downloads", id, user_downloads)
                    }
                    DownloadOutcome::UnknownUser => {}
                }
            }
        }
        Err(e) => {
            log::error!("Failed to deliver {} to chat {} [{}]: {}", url, chat_id, e.subcategory(), e);
            bot.send_message(chat_id, e.user_message(lang)).await?;
        }
    }
    Ok(())
}

async fn deliver(
    bot: &Bot,
    chat_id: ChatId,
    url: &Url,
    artifact: &TempArtifact,
    extractor: &dyn MediaExtractor,
    lang: Language,
) -> Result<(), DeliveryError> {
    let payload = extractor.extract(url, artifact).await?;
    let caption = t(lang, MessageKey::Success);

    match payload.kind {
        MediaKind::Video => {
            let mut request = bot
                .send_video(chat_id, InputFile::file(&payload.path))
                .caption(caption)
                .supports_streaming(true);
            if let Some(duration) = payload.duration_secs {
                request = request.duration(duration);
            }
            request.await?;
        }
        MediaKind::Image => {
            bot.send_photo(chat_id, InputFile::file(&payload.path))
                .caption(caption)
                .await?;
        }
    }
    log::info!(
        "Sent {:?} \"{}\" to chat {}",
        payload.kind,
        payload.title.as_deref().unwrap_or("untitled"),
        chat_id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_message_names_the_limit() {
        let err = DeliveryError::Download(DownloadError::DurationExceeded { actual: 700, max: 600 });
        assert!(err.user_message(Language::En).contains("600"));
    }

    #[test]
    fn other_failures_use_generic_message() {
        let err = DeliveryError::Download(DownloadError::YtDlp("ERROR: private video".into()));
        assert_eq!(err.user_message(Language::Ar), t(Language::Ar, MessageKey::Error));
    }

    #[test]
    fn log_category_follows_the_failure() {
        let err = DeliveryError::Download(DownloadError::Timeout(std::time::Duration::from_secs(300)));
        assert_eq!(err.subcategory(), "timeout");
        let err = DeliveryError::Download(DownloadError::DurationExceeded { actual: 700, max: 600 });
        assert_eq!(err.subcategory(), "duration");
    }
}
