//! Transaction contexts.
//!
//! A context owns its connection for its whole life and walks a small state machine:
//!
//! ```text
//! New -> Acquiring -> Active -> Committing  -> Completed
//!                            -> RollingBack -> Completed
//!                            -> Released            (caller-supplied connections)
//! ```
//!
//! Pooled contexts hand their connection back exactly once: released after a clean commit or
//! rollback, destroyed when the commit or rollback itself failed, and rolled back then released
//! from a background task if the context is dropped while still active. Nested contexts borrow
//! the outer connection and never reach the driver for commit or rollback.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::client::Pipeline;
use crate::error::SqlMiddlewareDbError;
use crate::pool::{ConnectionPool, DriverConnection, PooledConnection};
use crate::request::Request;
use crate::response::QueryOutput;

static NEXT_TXID: AtomicU64 = AtomicU64::new(1);

fn next_txid() -> u64 {
    NEXT_TXID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    New,
    Acquiring,
    Active,
    Committing,
    RollingBack,
    Completed,
    Released,
}

enum Handle<'c, P: ConnectionPool> {
    Pooled(PooledConnection<P>),
    Supplied(&'c mut P::Connection),
    Nested(&'c mut P::Connection),
    Done,
}

/// One transaction scope.
///
/// Obtain one with [`crate::Client::begin`], [`crate::Client::with_connection`], or
/// [`TransactionContext::nested`]. Finish it with exactly one of [`TransactionContext::commit`],
/// [`TransactionContext::rollback`], or [`TransactionContext::release`].
pub struct TransactionContext<'c, P: ConnectionPool> {
    txid: u64,
    state: TxState,
    handle: Handle<'c, P>,
    pipeline: Arc<Pipeline>,
}

impl<P: ConnectionPool> std::fmt::Debug for TransactionContext<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.handle {
            Handle::Pooled(_) => "pooled",
            Handle::Supplied(_) => "supplied",
            Handle::Nested(_) => "nested",
            Handle::Done => "done",
        };
        f.debug_struct("TransactionContext")
            .field("txid", &self.txid)
            .field("state", &self.state)
            .field("kind", &kind)
            .finish()
    }
}

impl<P: ConnectionPool> TransactionContext<'static, P> {
    /// Acquire a connection from `pool` and open a transaction on it.
    ///
    /// # Errors
    /// Returns the pool's error when no connection can be acquired, or a
    /// `SqlMiddlewareDbError::StatementError` when the driver refuses to begin. In the latter case
    /// the connection is destroyed.
    pub(crate) async fn begin(
        pool: Arc<P>,
        pipeline: Arc<Pipeline>,
    ) -> Result<Self, SqlMiddlewareDbError> {
        let txid = next_txid();
        debug!(txid, state = ?TxState::New, "transaction created");
        debug!(txid, state = ?TxState::Acquiring, "acquiring connection");

        let mut guard = PooledConnection::acquire(pool).await?;
        if let Err(source) = guard.conn_mut()?.begin().await {
            debug!(txid, error = %source, "begin failed");
            guard.destroy().await;
            return Err(SqlMiddlewareDbError::StatementError {
                statement: "BEGIN".to_string(),
                source,
            });
        }

        debug!(txid, state = ?TxState::Active, "transaction active");
        Ok(Self {
            txid,
            state: TxState::Active,
            handle: Handle::Pooled(guard),
            pipeline,
        })
    }
}

impl<'c, P: ConnectionPool> TransactionContext<'c, P> {
    /// Wrap a connection the caller owns. No statement is issued at the start or the end; the
    /// caller keeps the commit boundary and finishes the context with [`Self::release`].
    pub(crate) fn with_connection(conn: &'c mut P::Connection, pipeline: Arc<Pipeline>) -> Self {
        let txid = next_txid();
        debug!(txid, state = ?TxState::Active, "transaction on supplied connection");
        Self {
            txid,
            state: TxState::Active,
            handle: Handle::Supplied(conn),
            pipeline,
        }
    }

    /// Identifier used to tag this transaction's log events.
    #[must_use]
    pub fn txid(&self) -> u64 {
        self.txid
    }

    #[must_use]
    pub fn state(&self) -> TxState {
        self.state
    }

    #[must_use]
    pub fn is_nested(&self) -> bool {
        matches!(self.handle, Handle::Nested(_))
    }

    fn ensure_active(&self, action: &str) -> Result<(), SqlMiddlewareDbError> {
        if self.state == TxState::Active {
            Ok(())
        } else {
            Err(SqlMiddlewareDbError::TransactionState(format!(
                "cannot {action} transaction {} in state {:?}",
                self.txid, self.state
            )))
        }
    }

    /// The connection this transaction runs on.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::TransactionState` unless the transaction is active.
    pub fn conn_mut(&mut self) -> Result<&mut P::Connection, SqlMiddlewareDbError> {
        self.ensure_active("use")?;
        match &mut self.handle {
            Handle::Pooled(guard) => guard.conn_mut(),
            Handle::Supplied(conn) | Handle::Nested(conn) => Ok(&mut **conn),
            Handle::Done => Err(SqlMiddlewareDbError::TransactionState(format!(
                "transaction {} has no connection",
                self.txid
            ))),
        }
    }

    /// Compile, execute, and normalize one request inside this transaction.
    ///
    /// # Errors
    /// Returns compile, driver, or normalization errors; the transaction stays active.
    pub async fn run(
        &mut self,
        request: impl Into<Request>,
    ) -> Result<QueryOutput, SqlMiddlewareDbError> {
        let request = request.into();
        let pipeline = Arc::clone(&self.pipeline);
        let conn = self.conn_mut()?;
        pipeline.run_on(conn, &request).await
    }

    /// Open a nested scope on the same connection. It never commits or rolls back on the
    /// driver; only the outermost transaction controls the commit boundary.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::TransactionState` unless this transaction is active.
    pub fn nested(&mut self) -> Result<TransactionContext<'_, P>, SqlMiddlewareDbError> {
        let outer = self.txid;
        let pipeline = Arc::clone(&self.pipeline);
        let conn = self.conn_mut()?;
        let txid = next_txid();
        debug!(txid, outer, state = ?TxState::Active, "nested transaction");
        Ok(TransactionContext {
            txid,
            state: TxState::Active,
            handle: Handle::Nested(conn),
            pipeline,
        })
    }

    /// Commit and settle with `value`.
    ///
    /// Nested and caller-supplied contexts settle without touching the driver.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::CommitError` when the driver commit fails (the pooled
    /// connection is then destroyed), or `SqlMiddlewareDbError::TransactionState` when the
    /// transaction is not active.
    pub async fn commit<T>(mut self, value: T) -> Result<T, SqlMiddlewareDbError> {
        self.ensure_active("commit")?;
        self.transition(TxState::Committing);

        match std::mem::replace(&mut self.handle, Handle::Done) {
            Handle::Pooled(mut guard) => {
                let outcome = match guard.conn_mut() {
                    Ok(conn) => conn.commit().await,
                    Err(e) => {
                        self.transition(TxState::Completed);
                        return Err(e);
                    }
                };
                self.transition(TxState::Completed);
                match outcome {
                    Ok(()) => {
                        guard.release();
                        Ok(value)
                    }
                    Err(source) => {
                        debug!(txid = self.txid, error = %source, "commit failed");
                        guard.destroy().await;
                        Err(SqlMiddlewareDbError::CommitError(source))
                    }
                }
            }
            Handle::Supplied(_) | Handle::Nested(_) | Handle::Done => {
                self.transition(TxState::Completed);
                Ok(value)
            }
        }
    }

    /// Roll back after `err`.
    ///
    /// The result is always an error: `err` itself when the rollback succeeded, or
    /// `SqlMiddlewareDbError::RollbackError` when the rollback statement failed. A failed rollback
    /// takes precedence over `err`, which is dropped, and the pooled connection is destroyed.
    ///
    /// # Errors
    /// See above.
    pub async fn rollback<T>(
        mut self,
        err: SqlMiddlewareDbError,
    ) -> Result<T, SqlMiddlewareDbError> {
        self.ensure_active("roll back")?;
        self.transition(TxState::RollingBack);

        match std::mem::replace(&mut self.handle, Handle::Done) {
            Handle::Pooled(mut guard) => {
                let outcome = match guard.conn_mut() {
                    Ok(conn) => conn.rollback().await,
                    Err(e) => {
                        self.transition(TxState::Completed);
                        return Err(e);
                    }
                };
                self.transition(TxState::Completed);
                match outcome {
                    Ok(()) => {
                        guard.release();
                        Err(err)
                    }
                    Err(source) => {
                        debug!(
                            txid = self.txid,
                            error = %source,
                            original = %err,
                            "rollback failed, original error discarded"
                        );
                        guard.destroy().await;
                        Err(SqlMiddlewareDbError::RollbackError(source))
                    }
                }
            }
            Handle::Supplied(_) | Handle::Nested(_) | Handle::Done => {
                self.transition(TxState::Completed);
                Err(err)
            }
        }
    }

    /// Settle with `value` without issuing any statement. Only valid for caller-supplied
    /// connections; the caller still owns the commit boundary.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::TransactionState` for pooled or nested contexts, or when the
    /// transaction is not active.
    pub fn release<T>(mut self, value: T) -> Result<T, SqlMiddlewareDbError> {
        self.ensure_active("release")?;
        if !matches!(self.handle, Handle::Supplied(_)) {
            return Err(SqlMiddlewareDbError::TransactionState(format!(
                "transaction {} does not wrap a caller-supplied connection",
                self.txid
            )));
        }
        self.handle = Handle::Done;
        self.transition(TxState::Released);
        Ok(value)
    }

    fn transition(&mut self, next: TxState) {
        debug!(txid = self.txid, from = ?self.state, to = ?next, "transaction state");
        self.state = next;
    }
}

impl<P: ConnectionPool> Drop for TransactionContext<'_, P> {
    fn drop(&mut self) {
        let Handle::Pooled(guard) = &mut self.handle else {
            return;
        };
        if self.state != TxState::Active {
            return;
        }
        let txid = self.txid;
        let Some((pool, mut conn)) = guard.detach() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!(txid, "transaction dropped while active, rolling back");
                runtime.spawn(async move {
                    match conn.rollback().await {
                        Ok(()) => pool.release(conn),
                        Err(e) => {
                            warn!(txid, error = %e, "background rollback failed");
                            pool.destroy(conn).await;
                        }
                    }
                });
            }
            Err(_) => {
                warn!(txid, "transaction dropped outside a runtime, releasing without rollback");
                pool.release(conn);
            }
        }
    }
}
