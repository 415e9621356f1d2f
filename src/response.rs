//! Shapes raw driver responses into what the caller asked for.

use crate::compiled::{CompiledQuery, CompiledStatement};
use crate::error::SqlMiddlewareDbError;
use crate::pool::DriverResponse;
use crate::request::{Method, OutputTransform};
use crate::results::{CustomDbRow, ResultSet};
use crate::types::RowValues;

/// Normalized result of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// Full row set: plain selects, and DML returning several columns (or `*`).
    Rows(ResultSet),
    /// `first`: the first row, or `None` when nothing matched.
    Row(Option<CustomDbRow>),
    /// `pluck`, or DML returning exactly one column: one value per row.
    Values(Vec<RowValues>),
    /// DML without returning: the affected-row count.
    Count(usize),
    /// Schema statements.
    Unit,
}

impl QueryOutput {
    #[must_use]
    pub fn into_rows(self) -> Option<ResultSet> {
        match self {
            QueryOutput::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_values(self) -> Option<Vec<RowValues>> {
        match self {
            QueryOutput::Values(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_row(self) -> Option<CustomDbRow> {
        match self {
            QueryOutput::Row(row) => row,
            _ => None,
        }
    }

    #[must_use]
    pub fn count(&self) -> Option<usize> {
        match self {
            QueryOutput::Count(n) => Some(*n),
            _ => None,
        }
    }
}

/// Shape `response` according to the operation `query` was compiled from.
///
/// A caller-supplied `output` transform replaces every other rule. `max_rows` caps row
/// payloads of selects.
///
/// # Errors
/// Returns `SqlMiddlewareDbError::ExecutionError` when a pluck column is missing from the rows,
/// or whatever the transform returns.
pub fn normalize(
    query: &CompiledQuery,
    response: DriverResponse,
    output: Option<&OutputTransform>,
    max_rows: Option<usize>,
) -> Result<QueryOutput, SqlMiddlewareDbError> {
    if let Some(transform) = output {
        return transform(response);
    }
    match query {
        CompiledQuery::Sequence(_) => Ok(QueryOutput::Unit),
        CompiledQuery::Single(stmt) => normalize_statement(stmt, response, max_rows),
    }
}

fn normalize_statement(
    stmt: &CompiledStatement,
    response: DriverResponse,
    max_rows: Option<usize>,
) -> Result<QueryOutput, SqlMiddlewareDbError> {
    let mut rows = response.result_set;
    if let Some(max) = max_rows {
        rows.truncate(max);
    }

    match stmt.method {
        Method::Schema => Ok(QueryOutput::Unit),
        Method::Select => Ok(QueryOutput::Rows(rows)),
        Method::First => Ok(QueryOutput::Row(rows.into_first())),
        Method::Pluck => {
            let column = stmt.pluck.as_deref().ok_or_else(|| {
                SqlMiddlewareDbError::ExecutionError("pluck without a column".to_string())
            })?;
            rows.pluck(column).map(QueryOutput::Values)
        }
        Method::Insert | Method::Update | Method::Delete | Method::Counter => {
            match stmt.returning.as_deref() {
                Some([single]) if single != "*" => Ok(QueryOutput::Values(first_column(rows))),
                Some(cols) if !cols.is_empty() => Ok(QueryOutput::Rows(rows)),
                _ => Ok(QueryOutput::Count(response.rows_affected)),
            }
        }
    }
}

// One returning column was selected, so it is always the first value of each row.
fn first_column(rows: ResultSet) -> Vec<RowValues> {
    rows.results
        .into_iter()
        .filter_map(|row| row.rows.into_iter().next())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn stmt(method: Method) -> CompiledStatement {
        CompiledStatement::new("select 1".into(), Vec::new(), method)
    }

    fn id_rows(ids: &[i64]) -> ResultSet {
        ResultSet::from_rows(
            ["id", "name"],
            ids.iter()
                .map(|id| vec![RowValues::Int(*id), RowValues::Text(format!("n{id}"))])
                .collect(),
        )
    }

    #[test]
    fn single_returning_column_flattens() {
        let mut insert = stmt(Method::Insert);
        insert.returning = Some(vec!["id".into()]);
        let rs = ResultSet::from_rows(["id"], vec![vec![RowValues::Int(1)]]);
        let out = normalize(
            &CompiledQuery::Single(insert),
            DriverResponse::rows(rs),
            None,
            None,
        )
        .unwrap();
        assert_eq!(out, QueryOutput::Values(vec![RowValues::Int(1)]));
    }

    #[test]
    fn wildcard_or_many_columns_keep_rows() {
        for returning in [vec!["*".to_string()], vec!["id".into(), "name".into()]] {
            let mut insert = stmt(Method::Insert);
            insert.returning = Some(returning);
            let out = normalize(
                &CompiledQuery::Single(insert),
                DriverResponse::rows(id_rows(&[1, 2])),
                None,
                None,
            )
            .unwrap();
            assert_eq!(out, QueryOutput::Rows(id_rows(&[1, 2])));
        }
    }

    #[test]
    fn dml_without_returning_counts() {
        let out = normalize(
            &CompiledQuery::Single(stmt(Method::Update)),
            DriverResponse::affected(3),
            None,
            None,
        )
        .unwrap();
        assert_eq!(out.count(), Some(3));
    }

    #[test]
    fn first_and_pluck() {
        let first = normalize(
            &CompiledQuery::Single(stmt(Method::First)),
            DriverResponse::rows(id_rows(&[4, 5])),
            None,
            None,
        )
        .unwrap();
        assert_eq!(
            first.into_row().and_then(|r| r.get("id").cloned()),
            Some(RowValues::Int(4))
        );

        let empty = normalize(
            &CompiledQuery::Single(stmt(Method::First)),
            DriverResponse::rows(ResultSet::default()),
            None,
            None,
        )
        .unwrap();
        assert_eq!(empty, QueryOutput::Row(None));

        let mut pluck = stmt(Method::Pluck);
        pluck.pluck = Some("name".into());
        let names = normalize(
            &CompiledQuery::Single(pluck),
            DriverResponse::rows(id_rows(&[1, 2])),
            None,
            None,
        )
        .unwrap();
        assert_eq!(
            names.into_values().unwrap(),
            vec![RowValues::Text("n1".into()), RowValues::Text("n2".into())]
        );
    }

    #[test]
    fn max_rows_truncates_selects() {
        let out = normalize(
            &CompiledQuery::Single(stmt(Method::Select)),
            DriverResponse::rows(id_rows(&[1, 2, 3])),
            None,
            Some(2),
        )
        .unwrap();
        assert_eq!(out.into_rows().map(|rs| rs.len()), Some(2));
    }

    #[test]
    fn transform_overrides_everything() {
        let transform: OutputTransform = Arc::new(|resp: DriverResponse| {
            Ok::<_, SqlMiddlewareDbError>(QueryOutput::Count(resp.result_set.len() * 10))
        });
        let mut insert = stmt(Method::Insert);
        insert.returning = Some(vec!["id".into()]);
        let out = normalize(
            &CompiledQuery::Single(insert),
            DriverResponse::rows(id_rows(&[1])),
            Some(&transform),
            None,
        )
        .unwrap();
        assert_eq!(out, QueryOutput::Count(10));
    }

    #[test]
    fn schema_sequences_are_unit() {
        let seq = CompiledQuery::Sequence(vec![stmt(Method::Schema), stmt(Method::Schema)]);
        let out = normalize(&seq, DriverResponse::default(), None, None).unwrap();
        assert_eq!(out, QueryOutput::Unit);
    }
}
