use std::path::{Path, PathBuf};

use async_trait::async_trait;
use deadpool::managed::{self, Metrics, Object, RecycleError, RecycleResult};

use super::connection::SqliteConnection;
use crate::error::SqlMiddlewareDbError;
use crate::pool::ConnectionPool;

/// deadpool manager opening rusqlite connections on one database file.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    path: PathBuf,
}

impl SqliteManager {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl managed::Manager for SqliteManager {
    type Type = rusqlite::Connection;
    type Error = rusqlite::Error;

    async fn create(&self) -> Result<rusqlite::Connection, rusqlite::Error> {
        rusqlite::Connection::open(&self.path)
    }

    async fn recycle(
        &self,
        conn: &mut rusqlite::Connection,
        _metrics: &Metrics,
    ) -> RecycleResult<rusqlite::Error> {
        // A connection still inside a transaction must not be handed to the next caller.
        if conn.is_autocommit() {
            Ok(())
        } else {
            Err(RecycleError::Message("connection left inside a transaction".into()))
        }
    }
}

/// `SQLite` connection pool.
#[derive(Clone)]
pub struct SqlitePool {
    pool: managed::Pool<SqliteManager>,
}

impl std::fmt::Debug for SqlitePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePool")
            .field("status", &self.pool.status())
            .finish()
    }
}

impl SqlitePool {
    /// Build a pool of at most `max_size` connections on the database at `path`.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::ConfigError` for an empty path or zero size, and
    /// `SqlMiddlewareDbError::ConnectionError` if the pool cannot be built.
    pub fn new(path: impl Into<PathBuf>, max_size: usize) -> Result<Self, SqlMiddlewareDbError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(SqlMiddlewareDbError::ConfigError(
                "db_path is required".to_string(),
            ));
        }
        if max_size == 0 {
            return Err(SqlMiddlewareDbError::ConfigError(
                "max_size must be at least 1".to_string(),
            ));
        }
        let pool = managed::Pool::builder(SqliteManager::new(path))
            .max_size(max_size)
            .build()
            .map_err(|e| {
                SqlMiddlewareDbError::ConnectionError(format!("Failed to create SQLite pool: {e}"))
            })?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ConnectionPool for SqlitePool {
    type Connection = SqliteConnection;

    async fn acquire(&self) -> Result<SqliteConnection, SqlMiddlewareDbError> {
        self.pool
            .get()
            .await
            .map(SqliteConnection::new)
            .map_err(|e| SqlMiddlewareDbError::ConnectionError(format!("sqlite checkout error: {e}")))
    }

    fn release(&self, conn: SqliteConnection) {
        drop(conn);
    }

    async fn destroy(&self, conn: SqliteConnection) {
        if let Some(object) = conn.into_inner() {
            drop(Object::take(object));
        }
    }
}
