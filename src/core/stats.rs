//! Statistics Aggregator
//!
//! Derives summary figures from a store snapshot. Nothing here mutates
//! state; every call takes a fresh snapshot under the store lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::storage::{RecordStore, Store, StoreResult};

/// Aggregate figures derived from one store snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total_users: u64,
    /// Sum of every user's `download_count`.
    pub total_downloads: u64,
    pub downloads_by_language: BTreeMap<String, u64>,
}

impl Totals {
    /// Sum of the per-language counters.
    pub fn language_total(&self) -> u64 {
        self.downloads_by_language.values().sum()
    }

    /// Per-user and per-language counters are stored separately but only
    /// ever change together, so their sums must agree.
    pub fn is_consistent(&self) -> bool {
        self.total_downloads == self.language_total()
    }
}

/// Totals plus the system metadata shown by `/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    #[serde(flatten)]
    pub totals: Totals,
    pub version: String,
    pub start_date: DateTime<Utc>,
}

pub fn compute_totals(store: &Store) -> Totals {
    Totals {
        total_users: store.users.len() as u64,
        total_downloads: store.users.values().map(|u| u.download_count).sum(),
        downloads_by_language: store.global_stats.downloads_by_language.clone(),
    }
}

#[derive(Clone)]
pub struct StatsAggregator {
    store: Arc<RecordStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    pub async fn compute_totals(&self) -> StoreResult<Totals> {
        let totals = self.store.read(compute_totals).await?;
        if !totals.is_consistent() {
            log::warn!(
                "Download counters disagree: users sum to {}, languages sum to {}",
                totals.total_downloads,
                totals.language_total()
            );
        }
        Ok(totals)
    }

    pub async fn report(&self) -> StoreResult<StatsReport> {
        self.store
            .read(|store| StatsReport {
                totals: compute_totals(store),
                version: store.system.version.clone(),
                start_date: store.system.start_date,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::storage::UserRecord;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_store_has_zero_totals() {
        let totals = compute_totals(&Store::new("1"));

        assert_eq!(totals.total_users, 0);
        assert_eq!(totals.total_downloads, 0);
        assert_eq!(totals.language_total(), 0);
        assert!(totals.is_consistent());
    }

    #[test]
    fn sums_users_and_languages() {
        let mut store = Store::new("1");
        let mut alice = UserRecord::new(1, Language::En);
        alice.download_count = 3;
        let mut bob = UserRecord::new(2, Language::Ar);
        bob.download_count = 2;
        store.users.insert(1, alice);
        store.users.insert(2, bob);
        for _ in 0..3 {
            store.global_stats.increment("en");
        }
        for _ in 0..2 {
            store.global_stats.increment("ar");
        }

        let totals = compute_totals(&store);
        assert_eq!(totals.total_users, 2);
        assert_eq!(totals.total_downloads, 5);
        assert_eq!(totals.downloads_by_language.get("en"), Some(&3));
        assert_eq!(totals.downloads_by_language.get("ar"), Some(&2));
        assert!(totals.is_consistent());
    }

    #[test]
    fn detects_diverging_counters() {
        let mut store = Store::new("1");
        let mut user = UserRecord::new(1, Language::En);
        user.download_count = 1;
        store.users.insert(1, user);

        assert!(!compute_totals(&store).is_consistent());
    }

    #[test]
    fn report_serializes_flat() {
        let report = StatsReport {
            totals: compute_totals(&Store::new("2.0")),
            version: "2.0".to_string(),
            start_date: Utc::now(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total_users"], 0);
        assert_eq!(json["version"], "2.0");
    }
}
