//! Telegram bot handler tree configuration
//!
//! This module provides the main dispatcher schema for the Telegram bot
//! and the dependencies shared by every handler.

mod schema;
mod types;

pub use schema::schema;
pub use types::{user_id_of, HandlerDeps, HandlerError};
