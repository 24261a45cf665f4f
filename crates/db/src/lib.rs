//! Sqlite-backed quote history store.

pub mod connection;
pub mod history;
pub mod migrations;

pub use connection::{connect, connect_with_settings, DbPool};
pub use history::SqlHistoryStore;
pub use migrations::run_pending;
