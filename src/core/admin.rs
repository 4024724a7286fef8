//! Read-only admin lookups over the record store

use std::sync::Arc;

use crate::storage::{RecordStore, StoreResult, UserRecord};

#[derive(Clone)]
pub struct AdminQueries {
    store: Arc<RecordStore>,
}

impl AdminQueries {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// The stored record, or `None` when the id was never seen.
    pub async fn lookup_user(&self, user_id: i64) -> StoreResult<Option<UserRecord>> {
        self.store.read(|store| store.user(user_id).cloned()).await
    }

    /// Every known user id. Callers must not rely on the order.
    pub async fn list_all_user_ids(&self) -> StoreResult<Vec<i64>> {
        self.store.read(|store| store.users.keys().copied().collect()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::storage::UserDirectory;
    use tempfile::TempDir;

    #[tokio::test]
    async fn lookup_returns_record_or_none() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RecordStore::new(dir.path().join("data.json")));
        let users = UserDirectory::new(store.clone(), Language::En);
        let admin = AdminQueries::new(store);

        users.set_language(77, Language::Ar).await.unwrap();

        let record = admin.lookup_user(77).await.unwrap().unwrap();
        assert_eq!(record.user_id, 77);
        assert_eq!(record.language, Language::Ar);
        assert!(admin.lookup_user(78).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lists_every_known_id() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RecordStore::new(dir.path().join("data.json")));
        let users = UserDirectory::new(store.clone(), Language::En);
        let admin = AdminQueries::new(store);

        for id in [5, 1, 3] {
            users.register(id).await.unwrap();
        }

        let mut ids = admin.list_all_user_ids().await.unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 3, 5]);
    }
}
