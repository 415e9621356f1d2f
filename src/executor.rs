//! Runs compiled statements on one connection.
//!
//! A schema sequence runs strictly in order. A statement tagged with a tolerated DDL failure
//! swallows that failure when the dialect recognizes the driver code; anything else aborts the
//! sequence. A statement with a secondary (row-id refetch) runs the refetch after the primary
//! succeeds, and the refetched rows replace the primary's payload.

use tracing::{debug, trace};

use crate::compiled::{CompiledQuery, CompiledStatement, DriverParam};
use crate::dialect::DialectStrategy;
use crate::error::{DriverError, SqlMiddlewareDbError};
use crate::formatter::Formatter;
use crate::pool::{DriverConnection, DriverResponse};

/// Execute every statement of `query` in order.
///
/// Returns the response of the last statement that ran (an empty response when a tolerated
/// failure ended the sequence).
///
/// # Errors
/// Returns `SqlMiddlewareDbError::StatementError` for the first statement whose failure is not
/// tolerated, and `SqlMiddlewareDbError::CompilationError` for an empty statement.
pub async fn execute_query<C>(
    conn: &mut C,
    query: &CompiledQuery,
    dialect: &DialectStrategy,
) -> Result<DriverResponse, SqlMiddlewareDbError>
where
    C: DriverConnection + ?Sized,
{
    let mut last = DriverResponse::default();
    for stmt in query.statements() {
        match execute_statement(conn, stmt, dialect).await {
            Ok(response) => last = response,
            Err(SqlMiddlewareDbError::StatementError { statement, source })
                if tolerated(stmt, dialect, &source) =>
            {
                debug!(
                    sql = %statement,
                    code = ?source.code,
                    "ignoring expected ddl error"
                );
                last = DriverResponse::default();
            }
            Err(e) => return Err(e),
        }
    }
    Ok(last)
}

fn tolerated(stmt: &CompiledStatement, dialect: &DialectStrategy, err: &DriverError) -> bool {
    stmt.tolerates
        .is_some_and(|kind| dialect.is_ignorable_ddl_error(kind, err))
}

/// Execute one statement, plus its refetch when it has one.
///
/// # Errors
/// Driver failures come back as `SqlMiddlewareDbError::StatementError` carrying the SQL text
/// that failed. A missing row-id out-bind is an `SqlMiddlewareDbError::ExecutionError`.
pub async fn execute_statement<C>(
    conn: &mut C,
    stmt: &CompiledStatement,
    dialect: &DialectStrategy,
) -> Result<DriverResponse, SqlMiddlewareDbError>
where
    C: DriverConnection + ?Sized,
{
    if stmt.sql.trim().is_empty() {
        return Err(SqlMiddlewareDbError::CompilationError(
            "The query is empty".to_string(),
        ));
    }

    let params = Formatter::new(dialect, true).encode_bindings(&stmt.bindings);
    let mut response = dispatch(conn, &stmt.sql, &params).await?;

    if let Some(secondary) = &stmt.secondary {
        let row_ids = secondary
            .row_id_params
            .iter()
            .map(|name| {
                response
                    .out_binds
                    .get(name)
                    .cloned()
                    .map(DriverParam::In)
                    .ok_or_else(|| {
                        SqlMiddlewareDbError::ExecutionError(format!(
                            "driver returned no value for out-bind {name}"
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let refetched = dispatch(conn, &secondary.sql, &row_ids).await?;
        response.result_set = refetched.result_set;
    }

    Ok(response)
}

async fn dispatch<C>(
    conn: &mut C,
    sql: &str,
    params: &[DriverParam],
) -> Result<DriverResponse, SqlMiddlewareDbError>
where
    C: DriverConnection + ?Sized,
{
    trace!(sql, params = params.len(), "dispatching statement");
    conn.execute(sql, params)
        .await
        .map_err(|source| SqlMiddlewareDbError::StatementError {
            statement: sql.to_string(),
            source,
        })
}
