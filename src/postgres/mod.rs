//! `PostgreSQL` backend: tokio-postgres clients on a deadpool-postgres pool.

mod config;
mod connection;
mod params;
mod query;

pub use config::PostgresPool;
pub use connection::PostgresConnection;
