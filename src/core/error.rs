use thiserror::Error;

use crate::storage::StoreError;

/// Centralized error type for the application
///
/// Layer errors convert into this enum with `?`. Uses `thiserror` for
/// automatic conversion and display formatting.
///
/// # Example
///
/// ```no_run
/// use mediagrab::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Data file errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Report serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Localization catalog is missing messages
    #[error("Missing translations: {0}")]
    Catalog(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
