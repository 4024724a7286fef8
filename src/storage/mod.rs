//! Durable bot state: data model, file-backed record store and user directory

pub mod directory;
pub mod error;
pub mod model;
pub mod store;

// Re-exports for convenience
pub use directory::{DownloadOutcome, Registration, UserDirectory};
pub use error::{StoreError, StoreResult};
pub use model::{GlobalStats, Store, SystemInfo, UserRecord};
pub use store::RecordStore;
