use async_trait::async_trait;
use deadpool_postgres::{Config as PgConfig, Object, Pool, Runtime};
use tokio_postgres::NoTls;

use super::connection::PostgresConnection;
use crate::error::SqlMiddlewareDbError;
use crate::pool::ConnectionPool;

/// `PostgreSQL` connection pool.
#[derive(Clone)]
pub struct PostgresPool {
    pool: Pool,
}

impl std::fmt::Debug for PostgresPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresPool")
            .field("status", &self.pool.status())
            .finish()
    }
}

impl PostgresPool {
    /// Build a pool from a deadpool-postgres config.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::ConfigError` if required config fields are missing or
    /// `SqlMiddlewareDbError::ConnectionError` if pool creation fails.
    pub fn new(pg_config: PgConfig) -> Result<Self, SqlMiddlewareDbError> {
        if pg_config.dbname.is_none() {
            return Err(SqlMiddlewareDbError::ConfigError(
                "dbname is required".to_string(),
            ));
        }
        if pg_config.host.is_none() && pg_config.hosts.is_none() {
            return Err(SqlMiddlewareDbError::ConfigError(
                "host is required".to_string(),
            ));
        }
        if pg_config.user.is_none() {
            return Err(SqlMiddlewareDbError::ConfigError(
                "user is required".to_string(),
            ));
        }

        let pool = pg_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| {
                SqlMiddlewareDbError::ConnectionError(format!(
                    "Failed to create Postgres pool: {e}"
                ))
            })?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ConnectionPool for PostgresPool {
    type Connection = PostgresConnection;

    async fn acquire(&self) -> Result<PostgresConnection, SqlMiddlewareDbError> {
        self.pool
            .get()
            .await
            .map(PostgresConnection::new)
            .map_err(|e| {
                SqlMiddlewareDbError::ConnectionError(format!("postgres checkout error: {e}"))
            })
    }

    fn release(&self, conn: PostgresConnection) {
        drop(conn);
    }

    async fn destroy(&self, conn: PostgresConnection) {
        drop(Object::take(conn.into_inner()));
    }
}
