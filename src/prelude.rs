//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types so a single
//! `use sql_dialect_middleware::prelude::*;` is enough to build and run requests.

pub use crate::client::Client;
pub use crate::compiled::{CompiledQuery, DriverParam};
pub use crate::config::ClientConfig;
pub use crate::dialect::{BinaryEncoding, DialectStrategy};
pub use crate::error::{DriverError, SqlMiddlewareDbError};
pub use crate::pool::{ConnectionPool, DriverConnection, DriverResponse};
pub use crate::request::{
    ColumnDef, ColumnType, CompareOp, Direction, JoinKind, Predicate, QueryRequest, Request,
    SchemaRequest,
};
pub use crate::response::QueryOutput;
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::transaction::{TransactionContext, TxState};
pub use crate::translation::PlaceholderStyle;
pub use crate::types::{DatabaseType, RowValues};

#[cfg(feature = "postgres")]
pub use crate::postgres::{PostgresConnection, PostgresPool};
#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqlitePool};
