//! Per-user view over the record store
//!
//! A user becomes known the first time their language is set (explicitly,
//! or implicitly on first contact via [`UserDirectory::register`]). Known
//! users are never removed.

use std::sync::Arc;

use super::error::StoreResult;
use super::model::UserRecord;
use super::store::RecordStore;
use crate::i18n::Language;

/// Whether a call created the user record or found it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    Existing,
}

/// Result of [`UserDirectory::record_download`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Both counters were incremented; carries the user's new total.
    Recorded { user_downloads: u64 },
    /// No record for this user; nothing was counted.
    UnknownUser,
}

#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<RecordStore>,
    default_language: Language,
}

impl UserDirectory {
    pub fn new(store: Arc<RecordStore>, default_language: Language) -> Self {
        Self {
            store,
            default_language,
        }
    }

    pub fn default_language(&self) -> Language {
        self.default_language
    }

    /// Stored language of `user_id`, or the default for unknown users.
    ///
    /// Never fails: a read error is logged and answered with the default.
    pub async fn get_language(&self, user_id: i64) -> Language {
        let default = self.default_language;
        match self
            .store
            .read(|store| store.user(user_id).map(|u| u.language))
            .await
        {
            Ok(language) => language.unwrap_or(default),
            Err(e) => {
                log::error!("Failed to read language for user {}: {}", user_id, e);
                default
            }
        }
    }

    /// Sets the language, creating the user record on first sight.
    ///
    /// For a known user only the language changes; `first_seen` and the
    /// download counter stay untouched.
    pub async fn set_language(&self, user_id: i64, language: Language) -> StoreResult<Registration> {
        let registration = self
            .store
            .update(|store| match store.users.get_mut(&user_id) {
                Some(record) => {
                    record.language = language;
                    Registration::Existing
                }
                None => {
                    store.users.insert(user_id, UserRecord::new(user_id, language));
                    Registration::Created
                }
            })
            .await?;

        if registration == Registration::Created {
            log::info!("New user {} registered with language {}", user_id, language);
        }
        Ok(registration)
    }

    /// Registers `user_id` with the default language if unknown; a known
    /// user is left exactly as stored.
    pub async fn register(&self, user_id: i64) -> StoreResult<Registration> {
        let default = self.default_language;
        let registration = self
            .store
            .update(|store| {
                if store.contains_user(user_id) {
                    Registration::Existing
                } else {
                    store.users.insert(user_id, UserRecord::new(user_id, default));
                    Registration::Created
                }
            })
            .await?;

        if registration == Registration::Created {
            log::info!("New user {} registered on first contact", user_id);
        }
        Ok(registration)
    }

    /// Counts one completed download for `user_id` under `language`.
    ///
    /// The user counter and the per-language counter change in the same
    /// store transaction. Unknown users are not created and nothing is
    /// counted for them.
    pub async fn record_download(&self, user_id: i64, language: Language) -> StoreResult<DownloadOutcome> {
        let outcome = self
            .store
            .update(|store| {
                let Some(record) = store.users.get_mut(&user_id) else {
                    return DownloadOutcome::UnknownUser;
                };
                record.download_count += 1;
                let user_downloads = record.download_count;
                store.global_stats.increment(language.code());
                DownloadOutcome::Recorded { user_downloads }
            })
            .await?;

        if outcome == DownloadOutcome::UnknownUser {
            log::warn!(
                "Download recorded for unknown user {} ({}); counters left unchanged",
                user_id,
                language
            );
        }
        Ok(outcome)
    }
}
