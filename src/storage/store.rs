//! Single-file record store
//!
//! Every operation reads the whole data file, works on the decoded
//! [`Store`] and, for mutations, rewrites the whole file. A process-wide
//! async mutex serializes these read-modify-write cycles, so two concurrent
//! updates can never overwrite each other's changes.
//!
//! Writes go to a temporary sibling file which is then renamed over the
//! data file; a reader never sees a half-written store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::Mutex;

use super::error::StoreResult;
use super::model::Store;
use crate::core::config::BUILD_VERSION;

pub struct RecordStore {
    path: PathBuf,
    version: String,
    lock: Mutex<()>,
}

impl RecordStore {
    /// Creates a store handle for `path`; nothing is touched on disk yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_version(path, BUILD_VERSION)
    }

    /// Like [`RecordStore::new`] with an explicit version for freshly
    /// initialized stores.
    pub fn with_version(path: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
            lock: Mutex::new(()),
        }
    }

    /// Opens the store at process start, writing a default data file if none exists.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self::new(path);
        {
            let _guard = store.lock.lock().await;
            if fs_err::tokio::metadata(&store.path).await.is_err() {
                let fresh = store.fresh();
                store.write_unlocked(&fresh).await?;
                log::info!("Initialized data file {}", store.path.display());
            }
        }

        let snapshot = store.load().await?;
        log::info!(
            "Record store ready: {} users, version {}, running since {}",
            snapshot.users.len(),
            snapshot.system.version,
            snapshot.system.start_date
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads a consistent snapshot of the persisted state.
    ///
    /// An absent, empty or malformed file yields a fresh default store.
    /// Only genuine I/O failures (e.g. permission denied) are returned.
    pub async fn load(&self) -> StoreResult<Store> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    /// Replaces the persisted state with `store`.
    pub async fn save(&self, store: &Store) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        self.write_unlocked(store).await
    }

    /// Runs `read` against a snapshot taken under the store lock.
    pub async fn read<R>(&self, read: impl FnOnce(&Store) -> R) -> StoreResult<R> {
        let _guard = self.lock.lock().await;
        let store = self.read_unlocked().await?;
        Ok(read(&store))
    }

    /// Atomic read-modify-write.
    ///
    /// The lock is held from the read until the rename completes. When
    /// `mutate` leaves the store unchanged nothing is written. When the write
    /// fails the mutation is discarded and the previous file stays in place.
    pub async fn update<R>(&self, mutate: impl FnOnce(&mut Store) -> R) -> StoreResult<R> {
        let _guard = self.lock.lock().await;
        let mut store = self.read_unlocked().await?;
        let before = store.clone();
        let result = mutate(&mut store);
        if store != before {
            self.write_unlocked(&store).await?;
        }
        Ok(result)
    }

    fn fresh(&self) -> Store {
        Store::new(self.version.clone())
    }

    async fn read_unlocked(&self) -> StoreResult<Store> {
        let bytes = match fs_err::tokio::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("Data file {} not found, starting empty", self.path.display());
                return Ok(self.fresh());
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            log::info!("Data file {} is empty, starting empty", self.path.display());
            return Ok(self.fresh());
        }

        match Store::from_json(&bytes) {
            Ok(store) => Ok(store),
            Err(e) => {
                log::error!("Data file {} is corrupt ({}), reinitializing", self.path.display(), e);
                self.quarantine().await;
                let fresh = self.fresh();
                // Pin start_date; later reads would otherwise restamp it.
                if let Err(e) = self.write_unlocked(&fresh).await {
                    log::warn!("Failed to write reinitialized data file: {}", e);
                }
                Ok(fresh)
            }
        }
    }

    async fn write_unlocked(&self, store: &Store) -> StoreResult<()> {
        let bytes = store.to_json_pretty()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::tokio::create_dir_all(parent).await?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs_err::tokio::write(&temp_path, &bytes).await {
            let _ = fs_err::tokio::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs_err::tokio::rename(&temp_path, &self.path).await {
            let _ = fs_err::tokio::remove_file(&temp_path).await;
            return Err(e.into());
        }

        log::debug!("Saved {} users to {}", store.users.len(), self.path.display());
        Ok(())
    }

    /// Moves a corrupt data file aside so the next save does not destroy it.
    async fn quarantine(&self) {
        let target = self.quarantine_path();
        match fs_err::tokio::rename(&self.path, &target).await {
            Ok(()) => log::warn!("Corrupt data file kept as {}", target.display()),
            Err(e) => log::warn!("Failed to move corrupt data file aside: {}", e),
        }
    }

    fn temp_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.tmp.{}", self.path.display(), std::process::id()))
    }

    fn quarantine_path(&self) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S%.3f");
        PathBuf::from(format!("{}.corrupt.{}", self.path.display(), stamp))
    }
}
