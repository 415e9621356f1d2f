//! Compiles [`Request`]s into positioned SQL plus ordered bindings for one dialect.
//!
//! Every fragment is first rendered with the neutral `?` token; the finished text goes through
//! a single [`position_bindings`] pass at the end. Subqueries are spliced in neutral form so
//! their bindings keep their left-to-right order.

mod dml;
mod schema;
mod select;

use crate::compiled::{Binding, CompiledQuery, CompiledStatement};
use crate::dialect::DialectStrategy;
use crate::error::SqlMiddlewareDbError;
use crate::formatter::Formatter;
use crate::request::{Method, Predicate, QueryRequest, Request};
use crate::translation::{NEUTRAL_PLACEHOLDER, position_bindings};
use crate::types::RowValues;

/// SQL under construction, still using neutral placeholders.
#[derive(Debug, Default)]
pub(crate) struct SqlBuf {
    pub(crate) sql: String,
    pub(crate) bindings: Vec<Binding>,
}

impl SqlBuf {
    pub(crate) fn push(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }

    pub(crate) fn bind(&mut self, binding: impl Into<Binding>) {
        self.sql.push(NEUTRAL_PLACEHOLDER);
        self.bindings.push(binding.into());
    }

    pub(crate) fn bind_list(&mut self, values: &[RowValues]) {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.bind(value.clone());
        }
    }

    pub(crate) fn append(&mut self, other: SqlBuf) {
        self.sql.push_str(&other.sql);
        self.bindings.extend(other.bindings);
    }

    pub(crate) fn wrap(self, prefix: &str, suffix: &str) -> SqlBuf {
        SqlBuf {
            sql: format!("{prefix}{}{suffix}", self.sql),
            bindings: self.bindings,
        }
    }
}

/// A compiler bound to one dialect and a default quoting setting.
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler<'d> {
    dialect: &'d DialectStrategy,
    default_quoting: bool,
}

impl<'d> QueryCompiler<'d> {
    #[must_use]
    pub fn new(dialect: &'d DialectStrategy, default_quoting: bool) -> Self {
        Self {
            dialect,
            default_quoting,
        }
    }

    /// Compile any request.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::CompilationError` when the request cannot produce a
    /// statement (no table, empty insert or update, unsupported returning emulation).
    pub fn compile(&self, request: &Request) -> Result<CompiledQuery, SqlMiddlewareDbError> {
        match request {
            Request::Query(query) => self.compile_query(query).map(CompiledQuery::Single),
            Request::Schema(schema) => {
                let quoting = schema.quote_identifiers().unwrap_or(self.default_quoting);
                let fmt = Formatter::new(self.dialect, quoting);
                schema::compile_schema(&fmt, schema)
            }
        }
    }

    /// Compile a select/insert/update/delete/counter request into one statement.
    ///
    /// # Errors
    /// See [`QueryCompiler::compile`].
    pub fn compile_query(
        &self,
        request: &QueryRequest,
    ) -> Result<CompiledStatement, SqlMiddlewareDbError> {
        if request.table.trim().is_empty() {
            return Err(SqlMiddlewareDbError::CompilationError(
                "query has no target table".to_string(),
            ));
        }
        let quoting = request.quote_identifiers.unwrap_or(self.default_quoting);
        let fmt = Formatter::new(self.dialect, quoting);

        let (neutral, secondary) = match request.method {
            Method::Select | Method::Pluck | Method::First => {
                (select::compile_select(&fmt, request)?, None)
            }
            Method::Insert => dml::compile_insert(&fmt, request)?,
            Method::Update | Method::Counter => dml::compile_update(&fmt, request)?,
            Method::Delete => dml::compile_delete(&fmt, request)?,
            Method::Schema => {
                return Err(SqlMiddlewareDbError::CompilationError(
                    "schema statements are compiled from a SchemaRequest".to_string(),
                ));
            }
        };

        if neutral.sql.trim().is_empty() {
            return Err(SqlMiddlewareDbError::CompilationError(
                "The query is empty".to_string(),
            ));
        }

        let sql = position_bindings(&neutral.sql, self.dialect.placeholder_style).into_owned();
        let mut stmt = CompiledStatement::new(sql, neutral.bindings, request.method);
        stmt.returning = request.returning.clone();
        stmt.secondary = secondary;
        stmt.pluck = request.pluck.clone();
        Ok(stmt)
    }
}

/// Compile with the dialect's default (quoted) identifiers.
///
/// # Errors
/// See [`QueryCompiler::compile`].
pub fn compile(
    request: &Request,
    dialect: &DialectStrategy,
) -> Result<CompiledQuery, SqlMiddlewareDbError> {
    QueryCompiler::new(dialect, true).compile(request)
}

pub(crate) fn int_binding(n: u64, what: &str) -> Result<RowValues, SqlMiddlewareDbError> {
    i64::try_from(n)
        .map(RowValues::Int)
        .map_err(|_| SqlMiddlewareDbError::CompilationError(format!("{what} {n} is out of range")))
}

/// Render a `where` clause (with its leading space) for the top-level predicates.
pub(crate) fn render_where(
    fmt: &Formatter<'_>,
    predicates: &[Predicate],
    buf: &mut SqlBuf,
) -> Result<(), SqlMiddlewareDbError> {
    if predicates.is_empty() {
        return Ok(());
    }
    buf.push(" where ");
    render_joined(fmt, predicates, " and ", buf)
}

fn render_joined(
    fmt: &Formatter<'_>,
    predicates: &[Predicate],
    separator: &str,
    buf: &mut SqlBuf,
) -> Result<(), SqlMiddlewareDbError> {
    for (i, predicate) in predicates.iter().enumerate() {
        if i > 0 {
            buf.push(separator);
        }
        render_predicate(fmt, predicate, buf)?;
    }
    Ok(())
}

fn render_predicate(
    fmt: &Formatter<'_>,
    predicate: &Predicate,
    buf: &mut SqlBuf,
) -> Result<(), SqlMiddlewareDbError> {
    match predicate {
        Predicate::Compare { column, op, value } => {
            buf.push(&format!("{} {} ", fmt.identifier(column), op.as_sql()));
            buf.bind(value.clone());
        }
        Predicate::In { column, values } => {
            if values.is_empty() {
                buf.push("1 = 0");
            } else {
                buf.push(&format!("{} in (", fmt.identifier(column)));
                buf.bind_list(values);
                buf.push(")");
            }
        }
        Predicate::InSubquery { column, query } => {
            let sub = select::compile_select(fmt, query)?;
            buf.push(&format!("{} in ", fmt.identifier(column)));
            buf.append(sub.wrap("(", ")"));
        }
        Predicate::IsNull(column) => buf.push(&format!("{} is null", fmt.identifier(column))),
        Predicate::NotNull(column) => {
            buf.push(&format!("{} is not null", fmt.identifier(column)));
        }
        Predicate::Raw { sql, bindings } => {
            buf.push(sql);
            buf.bindings
                .extend(bindings.iter().cloned().map(Binding::Value));
        }
        Predicate::And(children) => {
            if children.is_empty() {
                buf.push("1 = 1");
            } else {
                buf.push("(");
                render_joined(fmt, children, " and ", buf)?;
                buf.push(")");
            }
        }
        Predicate::Or(children) => {
            if children.is_empty() {
                buf.push("1 = 0");
            } else {
                buf.push("(");
                render_joined(fmt, children, " or ", buf)?;
                buf.push(")");
            }
        }
        Predicate::Not(inner) => {
            buf.push("not (");
            render_predicate(fmt, inner, buf)?;
            buf.push(")");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
