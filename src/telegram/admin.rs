//! Admin commands: /stats, /broadcast, /cancelbroadcast, /userinfo
//!
//! Replies use MarkdownV2; every dynamic value goes through
//! [`escape_markdown_v2`].

use std::fmt::Write as _;

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::core::broadcast::{notify_all, BroadcastReport};
use crate::core::stats::StatsReport;
use crate::core::utils::{escape_markdown_v2, format_timestamp};
use crate::i18n::{t, t_count, Language, MessageKey};
use crate::storage::UserRecord;
use crate::telegram::commands::sender_language;
use crate::telegram::handlers::{user_id_of, HandlerDeps, HandlerError};
use crate::telegram::notifier::TelegramNotifier;

/// Replies with no-permission and returns `false` unless the sender is an admin.
async fn ensure_admin(bot: &Bot, msg: &Message, deps: &HandlerDeps, lang: Language) -> Result<bool, HandlerError> {
    let user_id = msg.from.as_ref().and_then(user_id_of);
    if user_id.is_some_and(|id| deps.is_admin(id)) {
        return Ok(true);
    }
    log::warn!("Rejected admin command from user {:?}", user_id);
    bot.send_message(msg.chat.id, t(lang, MessageKey::NoPermission)).await?;
    Ok(false)
}

pub fn format_stats_message(lang: Language, report: &StatsReport) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "*{}*", escape_markdown_v2(&t(lang, MessageKey::StatsTitle)));
    let _ = writeln!(
        text,
        "{}: {}",
        escape_markdown_v2(&t(lang, MessageKey::TotalUsers)),
        report.totals.total_users
    );
    let _ = writeln!(
        text,
        "{}: {}",
        escape_markdown_v2(&t(lang, MessageKey::TotalDownloads)),
        report.totals.total_downloads
    );
    let version = if report.version.trim().is_empty() {
        t(lang, MessageKey::Unknown)
    } else {
        report.version.clone()
    };
    let _ = writeln!(
        text,
        "{}: {}",
        escape_markdown_v2(&t(lang, MessageKey::BotVersion)),
        escape_markdown_v2(&version)
    );
    let _ = writeln!(
        text,
        "{}: {}",
        escape_markdown_v2(&t(lang, MessageKey::StartDate)),
        escape_markdown_v2(&format_timestamp(&report.start_date))
    );
    let _ = write!(text, "{}:", escape_markdown_v2(&t(lang, MessageKey::DownloadsByLang)));
    for (code, count) in &report.totals.downloads_by_language {
        let label = Language::from_code(code).map_or(code.as_str(), |l| l.label());
        let _ = write!(text, "\n\\- {}: {}", escape_markdown_v2(label), count);
    }
    text
}

pub fn format_user_info(lang: Language, record: &UserRecord) -> String {
    format!(
        "*{}*\n{}: `{}`\n{}: {}\n{}: {}\n{}: {}",
        escape_markdown_v2(&t(lang, MessageKey::UserInfoTitle)),
        escape_markdown_v2(&t(lang, MessageKey::UserId)),
        record.user_id,
        escape_markdown_v2(&t(lang, MessageKey::FirstSeen)),
        escape_markdown_v2(&format_timestamp(&record.first_seen)),
        escape_markdown_v2(&t(lang, MessageKey::Lang)),
        escape_markdown_v2(record.language.label()),
        escape_markdown_v2(&t(lang, MessageKey::DownloadCount)),
        record.download_count
    )
}

/// Messages sent to the admin once a broadcast ends.
pub fn broadcast_summary(lang: Language, report: &BroadcastReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.cancelled {
        lines.push(t(lang, MessageKey::BroadcastCancelled));
    }
    lines.push(t_count(lang, MessageKey::BroadcastSent, report.sent));
    if report.failed > 0 {
        lines.push(t_count(lang, MessageKey::BroadcastError, report.failed));
    }
    lines
}

pub async fn handle_stats(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let lang = sender_language(msg, deps).await;
    if !ensure_admin(bot, msg, deps, lang).await? {
        return Ok(());
    }

    let report = deps.stats.report().await?;
    bot.send_message(msg.chat.id, format_stats_message(lang, &report))
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    Ok(())
}

pub async fn handle_broadcast(bot: &Bot, msg: &Message, deps: &HandlerDeps, text: String) -> Result<(), HandlerError> {
    let lang = sender_language(msg, deps).await;
    if !ensure_admin(bot, msg, deps, lang).await? {
        return Ok(());
    }
    if text.trim().is_empty() {
        bot.send_message(msg.chat.id, t(lang, MessageKey::BroadcastUsage)).await?;
        return Ok(());
    }
    let Some(ticket) = deps.broadcast.try_begin() else {
        bot.send_message(msg.chat.id, t(lang, MessageKey::BroadcastBusy)).await?;
        return Ok(());
    };

    let ids = deps.admin.list_all_user_ids().await?;
    log::info!("Starting broadcast to {} users", ids.len());
    bot.send_message(msg.chat.id, t_count(lang, MessageKey::BroadcastStarted, ids.len() as u64))
        .await?;

    let bot = bot.clone();
    let chat_id = msg.chat.id;
    let options = deps.broadcast_options;
    tokio::spawn(async move {
        let notifier = TelegramNotifier::new(bot.clone());
        let report = notify_all(&ids, &text, &notifier, &options, ticket.token()).await;
        drop(ticket);

        for line in broadcast_summary(lang, &report) {
            if let Err(e) = bot.send_message(chat_id, line).await {
                log::error!("Failed to report broadcast result to chat {}: {}", chat_id, e);
            }
        }
    });
    Ok(())
}

pub async fn handle_cancel_broadcast(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let lang = sender_language(msg, deps).await;
    if !ensure_admin(bot, msg, deps, lang).await? {
        return Ok(());
    }

    // The running broadcast reports its own partial counts once it stops.
    if deps.broadcast.cancel() {
        log::info!("Broadcast cancellation requested from chat {}", msg.chat.id);
    } else {
        bot.send_message(msg.chat.id, t(lang, MessageKey::BroadcastNone)).await?;
    }
    Ok(())
}

pub async fn handle_userinfo(bot: &Bot, msg: &Message, deps: &HandlerDeps, arg: String) -> Result<(), HandlerError> {
    let lang = sender_language(msg, deps).await;
    if !ensure_admin(bot, msg, deps, lang).await? {
        return Ok(());
    }

    let Ok(user_id) = arg.trim().parse::<i64>() else {
        bot.send_message(msg.chat.id, t(lang, MessageKey::UserinfoUsage)).await?;
        return Ok(());
    };

    match deps.admin.lookup_user(user_id).await? {
        Some(record) => {
            bot.send_message(msg.chat.id, format_user_info(lang, &record))
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, t(lang, MessageKey::UserNotFound)).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stats::Totals;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn sample_report() -> StatsReport {
        let mut downloads_by_language = BTreeMap::new();
        downloads_by_language.insert("ar".to_string(), 2);
        downloads_by_language.insert("en".to_string(), 5);
        StatsReport {
            totals: Totals {
                total_users: 3,
                total_downloads: 7,
                downloads_by_language,
            },
            version: "3.1".to_string(),
            start_date: Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap(),
        }
    }

    #[test]
    fn stats_message_lists_totals_and_languages() {
        let text = format_stats_message(Language::En, &sample_report());

        assert!(text.starts_with("*📊 Bot Statistics*"));
        assert!(text.contains("Total Users: 3"));
        assert!(text.contains("Total Downloads: 7"));
        assert!(text.contains("3\\.1"));
        assert!(text.contains("2024\\-03\\-01 10:15 UTC"));
        assert!(text.contains("\\- English 🇬🇧: 5"));
        assert!(text.contains("\\- العربية 🇸🇦: 2"));
    }

    #[test]
    fn stats_message_keeps_unknown_codes() {
        let mut report = sample_report();
        report.totals.downloads_by_language.insert("fr".to_string(), 1);

        let text = format_stats_message(Language::En, &report);
        assert!(text.contains("\\- fr: 1"));
    }

    #[test]
    fn blank_version_is_shown_as_unknown() {
        let mut report = sample_report();
        report.version = String::new();

        let text = format_stats_message(Language::En, &report);
        assert!(text.contains("Bot Version: unknown"));
    }

    #[test]
    fn user_info_shows_every_field() {
        let mut record = UserRecord::new(42, Language::Ar);
        record.download_count = 9;
        record.first_seen = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let text = format_user_info(Language::En, &record);
        assert!(text.contains("`42`"));
        assert!(text.contains("2024\\-01\\-02 03:04 UTC"));
        assert!(text.contains("العربية"));
        assert!(text.contains("Download Count: 9"));
    }

    #[test]
    fn summary_reports_failures_and_cancellation() {
        let report = BroadcastReport {
            sent: 2,
            failed: 1,
            cancelled: true,
        };
        let lines = broadcast_summary(Language::En, &report);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], t(Language::En, MessageKey::BroadcastCancelled));
        assert!(lines[1].contains('2'));
        assert!(lines[2].contains('1'));

        let clean = BroadcastReport {
            sent: 4,
            failed: 0,
            cancelled: false,
        };
        assert_eq!(broadcast_summary(Language::En, &clean).len(), 1);
    }
}
