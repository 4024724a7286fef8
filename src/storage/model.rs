//! Durable state types and their persisted JSON shape
//!
//! The on-disk layout stays compatible with data files written by the
//! first (script) version of the bot:
//!
//! ```json
//! {
//!   "users": { "42": { "first_seen": "...", "lang": "en", "download_count": 3 } },
//!   "system": { "version": "3.1", "start_date": "..." },
//!   "global_stats": { "ar_downloads": 0, "en_downloads": 3 }
//! }
//! ```
//!
//! Loading validates and repairs the shape instead of trusting it: missing
//! sections get defaults, legacy naive timestamps are read as UTC, unknown
//! language codes fall back to the default language and malformed counters
//! are dropped. A user entry that cannot be repaired is skipped on its own;
//! it never takes the rest of the file down with it.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::IntoEnumIterator;

use crate::core::config::BUILD_VERSION;
use crate::i18n::Language;

/// Suffix of per-language counters inside `global_stats`.
const DOWNLOADS_SUFFIX: &str = "_downloads";

/// Bot-wide metadata written once when the store is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemInfo {
    pub version: String,
    #[serde(deserialize_with = "timestamp::deserialize_or_now")]
    pub start_date: DateTime<Utc>,
}

impl SystemInfo {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            start_date: Utc::now(),
        }
    }
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self::new(BUILD_VERSION)
    }
}

/// Aggregate download counters keyed by language code.
///
/// Codes are kept as plain strings so counters for languages that are no
/// longer offered survive a load/save cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalStats {
    pub downloads_by_language: BTreeMap<String, u64>,
}

impl GlobalStats {
    /// Counters for every supported language, all at zero.
    pub fn zeroed() -> Self {
        let downloads_by_language = Language::iter().map(|lang| (lang.code().to_string(), 0)).collect();
        Self { downloads_by_language }
    }

    pub fn increment(&mut self, code: &str) {
        *self.downloads_by_language.entry(code.to_string()).or_insert(0) += 1;
    }

    pub fn downloads(&self, code: &str) -> u64 {
        self.downloads_by_language.get(code).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.downloads_by_language.values().sum()
    }
}

impl Default for GlobalStats {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl Serialize for GlobalStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.downloads_by_language.len()))?;
        for (code, count) in &self.downloads_by_language {
            map.serialize_entry(&format!("{code}{DOWNLOADS_SUFFIX}"), count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for GlobalStats {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CountersVisitor;

        impl<'de> Visitor<'de> for CountersVisitor {
            type Value = GlobalStats;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of <language>_downloads counters")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut stats = GlobalStats::zeroed();
                while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
                    match (key.strip_suffix(DOWNLOADS_SUFFIX), value.as_u64()) {
                        (Some(code), Some(count)) if !code.is_empty() => {
                            stats.downloads_by_language.insert(code.to_string(), count);
                        }
                        _ => log::warn!("Dropping malformed global_stats entry {}={}", key, value),
                    }
                }
                Ok(stats)
            }
        }

        deserializer.deserialize_map(CountersVisitor)
    }
}

/// Per-user durable state.
///
/// `user_id` is the key of the `users` map on disk and is not repeated
/// inside the record; [`Store::from_json`] fills it in after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(skip)]
    pub user_id: i64,
    #[serde(default = "Utc::now", deserialize_with = "timestamp::deserialize_or_now")]
    pub first_seen: DateTime<Utc>,
    #[serde(rename = "lang", default, deserialize_with = "language_or_default")]
    pub language: Language,
    #[serde(default)]
    pub download_count: u64,
}

impl UserRecord {
    pub fn new(user_id: i64, language: Language) -> Self {
        Self {
            user_id,
            first_seen: Utc::now(),
            language,
            download_count: 0,
        }
    }
}

/// The whole persisted aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    #[serde(default, deserialize_with = "users_lenient")]
    pub users: BTreeMap<i64, UserRecord>,
    #[serde(default)]
    pub system: SystemInfo,
    #[serde(default)]
    pub global_stats: GlobalStats,
}

impl Store {
    /// Fresh store: no users, zeroed counters, `system` stamped now.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            users: BTreeMap::new(),
            system: SystemInfo::new(version),
            global_stats: GlobalStats::zeroed(),
        }
    }

    pub fn user(&self, user_id: i64) -> Option<&UserRecord> {
        self.users.get(&user_id)
    }

    pub fn contains_user(&self, user_id: i64) -> bool {
        self.users.contains_key(&user_id)
    }

    /// Parses a persisted store, repairing or skipping damaged user entries.
    ///
    /// Fails only when the document as a whole is not a store.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(BUILD_VERSION)
    }
}

fn language_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Language, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(Language::from_code).unwrap_or_else(|| {
        log::warn!("Unknown language code {} in user record, using default", raw);
        Language::default()
    }))
}

/// Reads the `users` map entry by entry, skipping ids and records that
/// cannot be repaired.
fn users_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeMap<i64, UserRecord>, D::Error> {
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    let mut users = BTreeMap::new();
    for (key, value) in raw {
        let Ok(user_id) = key.trim().parse::<i64>() else {
            log::warn!("Skipping user entry with non-numeric id '{}'", key);
            continue;
        };
        match serde_json::from_value::<UserRecord>(value) {
            Ok(mut record) => {
                record.user_id = user_id;
                users.insert(user_id, record);
            }
            Err(e) => log::warn!("Skipping malformed record of user {}: {}", user_id, e),
        }
    }
    Ok(users)
}

mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    /// Format `str(datetime.now())` produced in old data files.
    const LEGACY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, LEGACY_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Unreadable timestamps are replaced by the current time.
    pub fn deserialize_or_now<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(raw.as_str().and_then(parse).unwrap_or_else(|| {
            log::warn!("Unrecognized timestamp {}, using current time", raw);
            Utc::now()
        }))
    }
}
