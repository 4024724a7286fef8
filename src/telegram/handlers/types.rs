//! Handler types and dependencies

use std::path::PathBuf;
use std::sync::Arc;

use teloxide::types::User;

use crate::core::{AdminQueries, BroadcastControl, BroadcastOptions, StatsAggregator};
use crate::download::MediaExtractor;
use crate::storage::{RecordStore, UserDirectory};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub users: UserDirectory,
    pub stats: StatsAggregator,
    pub admin: AdminQueries,
    pub extractor: Arc<dyn MediaExtractor>,
    pub broadcast: Arc<BroadcastControl>,
    pub broadcast_options: BroadcastOptions,
    pub temp_dir: PathBuf,
    pub admin_ids: Arc<Vec<i64>>,
}

impl HandlerDeps {
    /// Wires every store-backed view to the same record store.
    pub fn new(
        store: Arc<RecordStore>,
        users: UserDirectory,
        extractor: Arc<dyn MediaExtractor>,
        broadcast_options: BroadcastOptions,
        temp_dir: PathBuf,
        admin_ids: Vec<i64>,
    ) -> Self {
        Self {
            users,
            stats: StatsAggregator::new(Arc::clone(&store)),
            admin: AdminQueries::new(store),
            extractor,
            broadcast: Arc::new(BroadcastControl::new()),
            broadcast_options,
            temp_dir,
            admin_ids: Arc::new(admin_ids),
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

/// Telegram user id as stored in the data file.
pub fn user_id_of(user: &User) -> Option<i64> {
    i64::try_from(user.id.0).ok()
}
