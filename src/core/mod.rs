//! Core utilities, configuration, statistics and admin operations

pub mod admin;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod logging;
pub mod stats;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use admin::AdminQueries;
pub use broadcast::{notify_all, BroadcastControl, BroadcastOptions, BroadcastReport, Notifier, NotifyError};
pub use error::{AppError, AppResult};
pub use logging::init_logger;
pub use stats::{compute_totals, StatsAggregator, StatsReport, Totals};
