//! The connection pool and driver boundary.
//!
//! Backends implement [`DriverConnection`] for a single connection and [`ConnectionPool`] for
//! checkout. Everything above this module (executor, transactions, client) is written against
//! these two traits only.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::compiled::DriverParam;
use crate::error::{DriverError, SqlMiddlewareDbError};
use crate::results::ResultSet;
use crate::types::RowValues;

/// What a driver reports back for one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverResponse {
    pub result_set: ResultSet,
    pub rows_affected: usize,
    /// Out-parameter values keyed by their bind name.
    pub out_binds: HashMap<String, RowValues>,
}

impl DriverResponse {
    /// Response for a statement that produced rows.
    #[must_use]
    pub fn rows(result_set: ResultSet) -> Self {
        Self {
            rows_affected: result_set.len(),
            result_set,
            out_binds: HashMap::new(),
        }
    }

    /// Response for a statement that only reports an affected-row count.
    #[must_use]
    pub fn affected(rows_affected: usize) -> Self {
        Self {
            rows_affected,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_out_bind(mut self, name: impl Into<String>, value: RowValues) -> Self {
        self.out_binds.insert(name.into(), value);
        self
    }
}

/// One live driver connection.
#[async_trait]
pub trait DriverConnection: Send {
    /// Run `sql` with positioned parameters.
    async fn execute(
        &mut self,
        sql: &str,
        params: &[DriverParam],
    ) -> Result<DriverResponse, DriverError>;

    /// Open a transaction (turn autocommit off) on this connection.
    async fn begin(&mut self) -> Result<(), DriverError>;

    async fn commit(&mut self) -> Result<(), DriverError>;

    async fn rollback(&mut self) -> Result<(), DriverError>;
}

/// A source of exclusively owned connections.
#[async_trait]
pub trait ConnectionPool: Send + Sync + 'static {
    type Connection: DriverConnection + 'static;

    /// Check a connection out. May wait for one to become free.
    async fn acquire(&self) -> Result<Self::Connection, SqlMiddlewareDbError>;

    /// Return a healthy connection to the pool.
    fn release(&self, conn: Self::Connection);

    /// Discard a connection whose state can no longer be trusted.
    async fn destroy(&self, conn: Self::Connection);
}

/// Scope guard for a checked-out connection.
///
/// The connection goes back to the pool exactly once: through [`PooledConnection::release`],
/// through [`PooledConnection::destroy`], or on drop if neither ran.
pub struct PooledConnection<P: ConnectionPool> {
    pool: Arc<P>,
    conn: Option<P::Connection>,
}

impl<P: ConnectionPool> fmt::Debug for PooledConnection<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("checked_out", &self.conn.is_some())
            .finish_non_exhaustive()
    }
}

impl<P: ConnectionPool> PooledConnection<P> {
    /// Check a connection out of `pool`.
    ///
    /// # Errors
    /// Returns whatever the pool reports when no connection can be obtained.
    pub async fn acquire(pool: Arc<P>) -> Result<Self, SqlMiddlewareDbError> {
        let conn = pool.acquire().await?;
        debug!("connection acquired");
        Ok(Self {
            pool,
            conn: Some(conn),
        })
    }

    /// Borrow the underlying connection.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::ExecutionError` if the connection was already handed back.
    pub fn conn_mut(&mut self) -> Result<&mut P::Connection, SqlMiddlewareDbError> {
        self.conn.as_mut().ok_or_else(|| {
            SqlMiddlewareDbError::ExecutionError("connection already returned to the pool".into())
        })
    }

    /// Return the connection to the pool.
    pub fn release(mut self) {
        self.release_inner();
    }

    /// Discard the connection instead of returning it.
    pub async fn destroy(mut self) {
        if let Some(conn) = self.conn.take() {
            debug!("connection destroyed");
            self.pool.destroy(conn).await;
        }
    }

    /// Take the connection out of the guard so a background task can finish with it.
    pub(crate) fn detach(&mut self) -> Option<(Arc<P>, P::Connection)> {
        self.conn.take().map(|conn| (self.pool.clone(), conn))
    }

    fn release_inner(&mut self) {
        if let Some(conn) = self.conn.take() {
            debug!("connection released");
            self.pool.release(conn);
        }
    }
}

impl<P: ConnectionPool> Drop for PooledConnection<P> {
    fn drop(&mut self) {
        self.release_inner();
    }
}
