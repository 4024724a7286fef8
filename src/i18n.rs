use std::collections::HashMap;

use fluent_templates::{
    fluent_bundle::{FluentArgs, FluentValue},
    static_loader, Loader,
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};
use unic_langid::LanguageIdentifier;

use crate::core::error::{AppError, AppResult};

static_loader! {
    static LOCALES = {
        locales: "./locales",
        fallback_language: "en",
        customise: |bundle| bundle.set_use_isolating(false),
    };
}

/// Languages the bot speaks.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

/// Prefix of the inline keyboard callback data that picks a language.
pub const LANG_CALLBACK_PREFIX: &str = "lang_";

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    /// Button label shown in the language picker.
    pub fn label(self) -> &'static str {
        match self {
            Language::En => "English 🇬🇧",
            Language::Ar => "العربية 🇸🇦",
        }
    }

    /// Parses a code such as `en`, `EN` or `en-US`.
    pub fn from_code(code: &str) -> Option<Language> {
        let base = code.split(['-', '_']).next().unwrap_or(code);
        Language::iter().find(|lang| lang.code().eq_ignore_ascii_case(base))
    }

    pub fn callback_data(self) -> String {
        format!("{}{}", LANG_CALLBACK_PREFIX, self.code())
    }

    pub fn from_callback_data(data: &str) -> Option<Language> {
        data.strip_prefix(LANG_CALLBACK_PREFIX).and_then(Language::from_code)
    }

    pub fn langid(self) -> LanguageIdentifier {
        self.code().parse().unwrap_or_default()
    }
}

/// Every message the bot can send. Ids match the Fluent message ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum MessageKey {
    Welcome,
    SelectLang,
    LanguagePrompt,
    Start,
    Help,
    Downloading,
    Success,
    Error,
    InvalidUrl,
    DurationExceeded,
    LangSet,
    NoPermission,
    StatsTitle,
    TotalUsers,
    TotalDownloads,
    BotVersion,
    StartDate,
    DownloadsByLang,
    BroadcastUsage,
    BroadcastStarted,
    BroadcastSent,
    BroadcastError,
    BroadcastBusy,
    BroadcastCancelled,
    BroadcastNone,
    UserinfoUsage,
    UserNotFound,
    UserInfoTitle,
    UserId,
    FirstSeen,
    Lang,
    DownloadCount,
    Unknown,
}

/// Returns a localized string for the given key.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
pub fn t(lang: Language, key: MessageKey) -> String {
    let text = LOCALES
        .lookup(&lang.langid(), key.as_ref())
        .unwrap_or_else(|| key.as_ref().to_string());
    text.replace("\\n", "\n")
}

/// Returns a localized string with arguments for interpolation.
pub fn t_args(lang: Language, key: MessageKey, args: &FluentArgs) -> String {
    let args_map: HashMap<String, FluentValue> = args.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();

    let text = LOCALES
        .lookup_with_args(&lang.langid(), key.as_ref(), &args_map)
        .unwrap_or_else(|| key.as_ref().to_string());
    text.replace("\\n", "\n")
}

/// Shorthand for messages taking a single `$count` argument.
pub fn t_count(lang: Language, key: MessageKey, count: u64) -> String {
    let mut args = FluentArgs::new();
    args.set("count", count);
    t_args(lang, key, &args)
}

/// Resolves `key` in `lang` alone, without falling back to another language.
///
/// `$count` is bound to a placeholder: formatting a message without a
/// variable it references panics inside the loader.
fn resolve_exact(lang: Language, key: MessageKey) -> Option<String> {
    let args: HashMap<&str, FluentValue> = HashMap::from([("count", FluentValue::from(0))]);
    LOCALES.lookup_single_language(&lang.langid(), key.as_ref(), Some(&args))
}

/// Lists `lang:key` for every pair `resolve` has no non-blank text for.
fn find_missing(resolve: impl Fn(Language, MessageKey) -> Option<String>) -> Vec<String> {
    Language::iter()
        .flat_map(|lang| MessageKey::iter().map(move |key| (lang, key)))
        .filter(|&(lang, key)| resolve(lang, key).map(|text| text.trim().is_empty()).unwrap_or(true))
        .map(|(lang, key)| format!("{}:{}", lang.code(), key.as_ref()))
        .collect()
}

/// Checks that every message is translated for every language.
///
/// Run at startup; a gap in the catalog aborts the bot instead of
/// surfacing as a raw message id or a silent English fallback in a chat.
pub fn validate_catalog() -> AppResult<()> {
    let missing = find_missing(resolve_exact);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Catalog(missing.join(", ")))
    }
}
