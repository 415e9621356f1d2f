use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::info;

use crate::compiled::CompiledQuery;
use crate::compiler::QueryCompiler;
use crate::config::ClientConfig;
use crate::dialect::DialectStrategy;
use crate::error::SqlMiddlewareDbError;
use crate::executor::execute_query;
use crate::pool::{ConnectionPool, DriverConnection, PooledConnection};
use crate::request::Request;
use crate::response::{QueryOutput, normalize};
use crate::transaction::TransactionContext;

/// Compile, execute, normalize. Shared read-only by a client and its transactions.
#[derive(Debug)]
pub(crate) struct Pipeline {
    dialect: DialectStrategy,
    quote_identifiers: bool,
    max_rows: Option<usize>,
}

impl Pipeline {
    pub(crate) fn new(config: &ClientConfig) -> Self {
        Self {
            dialect: config.dialect(),
            quote_identifiers: config.quote_identifiers,
            max_rows: config.max_rows,
        }
    }

    pub(crate) fn compile(&self, request: &Request) -> Result<CompiledQuery, SqlMiddlewareDbError> {
        QueryCompiler::new(&self.dialect, self.quote_identifiers).compile(request)
    }

    pub(crate) async fn run_on<C>(
        &self,
        conn: &mut C,
        request: &Request,
    ) -> Result<QueryOutput, SqlMiddlewareDbError>
    where
        C: DriverConnection + ?Sized,
    {
        let compiled = self.compile(request)?;
        let response = execute_query(conn, &compiled, &self.dialect).await?;
        normalize(&compiled, response, request.output(), self.max_rows)
    }
}

/// Entry point: one configured dialect over one connection pool.
///
/// ```rust,no_run
/// # #[cfg(feature = "sqlite")]
/// # async fn demo() -> Result<(), sql_dialect_middleware::SqlMiddlewareDbError> {
/// use sql_dialect_middleware::prelude::*;
///
/// let pool = SqlitePool::new("app.db", 4)?;
/// let client = Client::new(pool, ClientConfig::new(DatabaseType::Sqlite));
///
/// let ids = client
///     .run(QueryRequest::insert_one("users", vec![("name", "alice".into())]).returning(["id"]))
///     .await?;
/// # let _ = ids;
/// # Ok(())
/// # }
/// ```
pub struct Client<P: ConnectionPool> {
    pool: Arc<P>,
    config: ClientConfig,
    pipeline: Arc<Pipeline>,
}

impl<P: ConnectionPool> Clone for Client<P> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            config: self.config.clone(),
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl<P: ConnectionPool> std::fmt::Debug for Client<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<P: ConnectionPool> Client<P> {
    /// Build a client. This is the one place the crate logs at startup.
    #[must_use]
    pub fn new(pool: P, config: ClientConfig) -> Self {
        Self::from_shared(Arc::new(pool), config)
    }

    #[must_use]
    pub fn from_shared(pool: Arc<P>, config: ClientConfig) -> Self {
        let pipeline = Arc::new(Pipeline::new(&config));
        info!(
            dialect = pipeline.dialect.name,
            quote_identifiers = config.quote_identifiers,
            max_rows = ?config.max_rows,
            "sql client initialized"
        );
        Self {
            pool,
            config,
            pipeline,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn dialect(&self) -> &DialectStrategy {
        &self.pipeline.dialect
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<P> {
        &self.pool
    }

    /// Compile without touching the database.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::CompilationError` for requests that cannot be compiled.
    pub fn to_sql(&self, request: impl Into<Request>) -> Result<CompiledQuery, SqlMiddlewareDbError> {
        self.pipeline.compile(&request.into())
    }

    /// Run one request on a connection checked out for just this call.
    ///
    /// # Errors
    /// Returns compile errors before any connection is acquired, then pool, driver, or
    /// normalization errors. The connection goes back to the pool on every path.
    pub async fn run(&self, request: impl Into<Request>) -> Result<QueryOutput, SqlMiddlewareDbError> {
        let request = request.into();
        let compiled = self.pipeline.compile(&request)?;
        let mut guard = PooledConnection::acquire(Arc::clone(&self.pool)).await?;
        let response = execute_query(guard.conn_mut()?, &compiled, &self.pipeline.dialect).await;
        guard.release();
        normalize(&compiled, response?, request.output(), self.pipeline.max_rows)
    }

    /// Run one request on a connection the caller already holds.
    ///
    /// # Errors
    /// Returns compile, driver, or normalization errors.
    pub async fn run_on(
        &self,
        conn: &mut P::Connection,
        request: impl Into<Request>,
    ) -> Result<QueryOutput, SqlMiddlewareDbError> {
        self.pipeline.run_on(conn, &request.into()).await
    }

    /// Acquire a connection and open a transaction on it.
    ///
    /// # Errors
    /// Returns pool errors, or the driver's refusal to begin.
    pub async fn begin(&self) -> Result<TransactionContext<'static, P>, SqlMiddlewareDbError> {
        TransactionContext::begin(Arc::clone(&self.pool), Arc::clone(&self.pipeline)).await
    }

    /// Wrap a caller-owned connection in a transaction context that issues no begin, commit,
    /// or rollback of its own. Finish it with [`TransactionContext::release`].
    #[must_use]
    pub fn with_connection<'c>(&self, conn: &'c mut P::Connection) -> TransactionContext<'c, P> {
        TransactionContext::with_connection(conn, Arc::clone(&self.pipeline))
    }

    /// Run `f` inside a transaction: commit when it returns `Ok`, roll back when it returns
    /// `Err`. A failed rollback replaces the closure's error.
    ///
    /// ```rust,no_run
    /// # use sql_dialect_middleware::prelude::*;
    /// # async fn demo<P: ConnectionPool>(client: Client<P>) -> Result<(), SqlMiddlewareDbError> {
    /// let moved = client
    ///     .transaction(|tx| {
    ///         Box::pin(async move {
    ///             tx.run(QueryRequest::decrement("accounts", "balance", 10).where_eq("id", 1))
    ///                 .await?;
    ///             tx.run(QueryRequest::increment("accounts", "balance", 10).where_eq("id", 2))
    ///                 .await?;
    ///             Ok(10)
    ///         })
    ///     })
    ///     .await?;
    /// # let _ = moved;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns the closure's error after a successful rollback, the rollback error otherwise,
    /// or a commit error.
    pub async fn transaction<T, F>(&self, f: F) -> Result<T, SqlMiddlewareDbError>
    where
        F: for<'t> FnOnce(
            &'t mut TransactionContext<'static, P>,
        ) -> BoxFuture<'t, Result<T, SqlMiddlewareDbError>>,
    {
        let mut tx = self.begin().await?;
        let outcome = f(&mut tx).await;
        match outcome {
            Ok(value) => tx.commit(value).await,
            Err(err) => tx.rollback(err).await,
        }
    }
}
