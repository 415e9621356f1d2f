//! `SQLite` backend: rusqlite connections on a deadpool managed pool.
//!
//! Statements run inline on the calling task; a statement holds its task's thread until it
//! finishes.

mod config;
mod connection;
mod params;
mod query;

pub use config::{SqliteManager, SqlitePool};
pub use connection::SqliteConnection;
