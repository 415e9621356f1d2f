#![cfg_attr(docsrs, feature(doc_cfg))]
//! Cross-dialect SQL request compiler with an async execution pipeline.
//!
//! Requests are built as dialect-neutral values ([`QueryRequest`], [`SchemaRequest`]),
//! compiled into dialect-specific SQL and bindings by a [`DialectStrategy`], executed on a
//! pooled connection, and normalized into a [`QueryOutput`]. Transactions own their
//! connection for their whole life and always hand it back exactly once.

pub mod prelude;

pub mod client;
pub mod compiled;
pub mod compiler;
pub mod config;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod pool;
pub mod request;
pub mod response;
pub mod results;
pub mod transaction;
pub mod translation;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use client::Client;
pub use compiled::{Binding, CompiledQuery, CompiledStatement, DriverParam};
pub use config::ClientConfig;
pub use dialect::DialectStrategy;
pub use error::{DriverError, SqlMiddlewareDbError};
pub use pool::{ConnectionPool, DriverConnection, DriverResponse};
pub use request::{QueryRequest, Request, SchemaRequest};
pub use response::QueryOutput;
pub use results::{CustomDbRow, ResultSet};
pub use transaction::{TransactionContext, TxState};
pub use types::{DatabaseType, RowValues};
