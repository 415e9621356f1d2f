use thiserror::Error;

/// Opaque failure reported by a driver for one statement, commit, or rollback.
///
/// `code` carries the backend's numeric error code when it has one (Oracle `ORA-00955` is
/// `Some(955)`); the idempotent-DDL predicates of a dialect only look at this field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DriverError {
    pub code: Option<i32>,
    pub sqlstate: Option<String>,
    pub message: String,
}

impl DriverError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            sqlstate: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            sqlstate: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_sqlstate(mut self, sqlstate: impl Into<String>) -> Self {
        self.sqlstate = Some(sqlstate.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum SqlMiddlewareDbError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    /// The request could not be turned into SQL. Raised before any I/O.
    #[error("Compilation error: {0}")]
    CompilationError(String),

    /// A statement failed on the driver; `statement` is the SQL text that was dispatched.
    #[error("Statement error: {source} (sql: {statement})")]
    StatementError {
        statement: String,
        #[source]
        source: DriverError,
    },

    #[error("Commit failed: {0}")]
    CommitError(#[source] DriverError),

    /// The rollback statement failed. This replaces whatever error asked for the rollback.
    #[error("Rollback failed: {0}")]
    RollbackError(#[source] DriverError),

    #[error("Transaction state error: {0}")]
    TransactionState(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),

    #[error("Other database error: {0}")]
    Other(String),
}

impl SqlMiddlewareDbError {
    /// The driver error behind this failure, if one exists.
    #[must_use]
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            SqlMiddlewareDbError::StatementError { source, .. }
            | SqlMiddlewareDbError::CommitError(source)
            | SqlMiddlewareDbError::RollbackError(source) => Some(source),
            _ => None,
        }
    }
}
