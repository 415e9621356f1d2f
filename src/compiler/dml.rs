use std::collections::BTreeSet;

use crate::compiled::{Binding, ReturningPlaceholder, SecondaryStatement};
use crate::dialect::ReturningStrategy;
use crate::error::SqlMiddlewareDbError;
use crate::formatter::Formatter;
use crate::request::{Method, QueryRequest};
use crate::translation::position_bindings;
use crate::types::RowValues;

use super::{SqlBuf, render_where};

type Compiled = (SqlBuf, Option<SecondaryStatement>);

pub(crate) fn compile_insert(
    fmt: &Formatter<'_>,
    req: &QueryRequest,
) -> Result<Compiled, SqlMiddlewareDbError> {
    if req.rows.is_empty() {
        return Err(SqlMiddlewareDbError::CompilationError(
            "insert has no rows".to_string(),
        ));
    }
    let columns: Vec<&str> = req
        .rows
        .iter()
        .flat_map(|row| row.iter().map(|(col, _)| col.as_str()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if columns.is_empty() {
        return Err(SqlMiddlewareDbError::CompilationError(
            "insert has no columns".to_string(),
        ));
    }

    let dialect = fmt.dialect();
    let returning = non_empty(req.returning.as_deref());
    let table = fmt.identifier(&req.table);
    let column_list = columns
        .iter()
        .map(|c| fmt.identifier(c))
        .collect::<Vec<_>>()
        .join(", ");

    let mut buf = SqlBuf::default();
    let refetch = dialect.returning_strategy == ReturningStrategy::OutParamRefetch;

    if refetch && req.rows.len() > 1 {
        if let Some(cols) = returning {
            // One insert per row, each handing back its own row id.
            buf.push("begin");
            let mut out_names = Vec::with_capacity(req.rows.len());
            for (ordinal, row) in req.rows.iter().enumerate() {
                buf.push(&format!(" insert into {table} ({column_list}) values ("));
                bind_row(&mut buf, &columns, row);
                buf.push(")");
                out_names.push(bind_row_id(&mut buf, cols, ordinal));
                buf.push(";");
            }
            buf.push(" end;");
            let secondary = refetch_statement(fmt, &req.table, cols, out_names);
            return Ok((buf, Some(secondary)));
        }

        buf.push("insert all");
        for row in &req.rows {
            buf.push(&format!(" into {table} ({column_list}) values ("));
            bind_row(&mut buf, &columns, row);
            buf.push(")");
        }
        buf.push(" select 1 from dual");
        return Ok((buf, None));
    }

    buf.push(&format!("insert into {table} ({column_list})"));
    if let (ReturningStrategy::Output, Some(cols)) = (dialect.returning_strategy, returning) {
        buf.push(&output_clause(fmt, "inserted", cols));
    }
    buf.push(" values ");
    for (i, row) in req.rows.iter().enumerate() {
        if i > 0 {
            buf.push(", ");
        }
        buf.push("(");
        bind_row(&mut buf, &columns, row);
        buf.push(")");
    }

    let secondary = append_trailing_returning(fmt, &mut buf, &req.table, returning);
    Ok((buf, secondary))
}

pub(crate) fn compile_update(
    fmt: &Formatter<'_>,
    req: &QueryRequest,
) -> Result<Compiled, SqlMiddlewareDbError> {
    let dialect = fmt.dialect();
    let returning = non_empty(req.returning.as_deref());
    let mut buf = SqlBuf::default();
    buf.push(&format!("update {} set ", fmt.identifier(&req.table)));

    if req.method == Method::Counter {
        let counter = req.counter.as_ref().ok_or_else(|| {
            SqlMiddlewareDbError::CompilationError("counter has no column".to_string())
        })?;
        let column = fmt.identifier(&counter.column);
        let sign = if counter.amount < 0 { '-' } else { '+' };
        let amount = counter.amount.checked_abs().ok_or_else(|| {
            SqlMiddlewareDbError::CompilationError(format!(
                "counter amount {} is out of range",
                counter.amount
            ))
        })?;
        buf.push(&format!("{column} = {column} {sign} "));
        buf.bind(RowValues::Int(amount));
    } else {
        if req.assignments.is_empty() {
            return Err(SqlMiddlewareDbError::CompilationError(
                "update has no values".to_string(),
            ));
        }
        for (i, (column, value)) in req.assignments.iter().enumerate() {
            if i > 0 {
                buf.push(", ");
            }
            buf.push(&format!("{} = ", fmt.identifier(column)));
            buf.bind(value.clone());
        }
    }

    if let (ReturningStrategy::Output, Some(cols)) = (dialect.returning_strategy, returning) {
        buf.push(&output_clause(fmt, "inserted", cols));
    }
    render_where(fmt, &req.predicates, &mut buf)?;

    let secondary = append_trailing_returning(fmt, &mut buf, &req.table, returning);
    Ok((buf, secondary))
}

pub(crate) fn compile_delete(
    fmt: &Formatter<'_>,
    req: &QueryRequest,
) -> Result<Compiled, SqlMiddlewareDbError> {
    let dialect = fmt.dialect();
    let returning = non_empty(req.returning.as_deref());
    if dialect.returning_strategy == ReturningStrategy::OutParamRefetch && returning.is_some() {
        return Err(SqlMiddlewareDbError::CompilationError(
            "deleted rows cannot be refetched by row id".to_string(),
        ));
    }

    let mut buf = SqlBuf::default();
    buf.push(&format!("delete from {}", fmt.identifier(&req.table)));
    if let (ReturningStrategy::Output, Some(cols)) = (dialect.returning_strategy, returning) {
        buf.push(&output_clause(fmt, "deleted", cols));
    }
    render_where(fmt, &req.predicates, &mut buf)?;
    let secondary = append_trailing_returning(fmt, &mut buf, &req.table, returning);
    Ok((buf, secondary))
}

fn non_empty(returning: Option<&[String]>) -> Option<&[String]> {
    returning.filter(|cols| !cols.is_empty())
}

fn bind_row(buf: &mut SqlBuf, columns: &[&str], row: &[(String, RowValues)]) {
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            buf.push(", ");
        }
        let value = row
            .iter()
            .find(|(name, _)| name == column)
            .map_or(RowValues::Null, |(_, value)| value.clone());
        buf.bind(value);
    }
}

fn output_clause(fmt: &Formatter<'_>, pseudo_table: &str, columns: &[String]) -> String {
    let cols = columns
        .iter()
        .map(|c| format!("{pseudo_table}.{}", fmt.identifier(c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(" output {cols}")
}

/// Native `returning` or the row-id out-parameter; the latter also yields the refetch.
fn append_trailing_returning(
    fmt: &Formatter<'_>,
    buf: &mut SqlBuf,
    table: &str,
    returning: Option<&[String]>,
) -> Option<SecondaryStatement> {
    let columns = returning?;
    match fmt.dialect().returning_strategy {
        ReturningStrategy::Native => {
            buf.push(" returning ");
            buf.push(&fmt.columnize(columns));
            None
        }
        ReturningStrategy::Output => None,
        ReturningStrategy::OutParamRefetch => {
            let out_name = bind_row_id(buf, columns, 0);
            Some(refetch_statement(fmt, table, columns, vec![out_name]))
        }
    }
}

/// Append `returning ROWID into ?` and return the out-bind name it will be read back from.
fn bind_row_id(buf: &mut SqlBuf, columns: &[String], ordinal: usize) -> String {
    let placeholder = ReturningPlaceholder {
        column: columns.join(":"),
        ordinal,
    };
    let out_name = placeholder.out_bind_name();
    buf.push(" returning ROWID into ");
    buf.bind(Binding::Returning(placeholder));
    out_name
}

fn refetch_statement(
    fmt: &Formatter<'_>,
    table: &str,
    columns: &[String],
    out_names: Vec<String>,
) -> SecondaryStatement {
    let neutral = format!(
        "select {} from {} where ROWID in ({})",
        fmt.columnize(columns),
        fmt.identifier(table),
        vec!["?"; out_names.len()].join(", ")
    );
    SecondaryStatement {
        sql: position_bindings(&neutral, fmt.dialect().placeholder_style).into_owned(),
        row_id_params: out_names,
    }
}
