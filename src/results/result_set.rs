use std::collections::HashMap;
use std::sync::Arc;

use super::row::{CustomDbRow, index_columns};
use crate::error::SqlMiddlewareDbError;
use crate::types::RowValues;

/// A result set from a database query
///
/// Holds the rows a statement produced plus the affected-row count the driver reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
    /// The number of rows affected (for DML statements)
    pub rows_affected: usize,
    column_names: Option<Arc<Vec<String>>>,
    #[doc(hidden)]
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create a new result set with a known capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            ..ResultSet::default()
        }
    }

    /// Build a result set from column names and row values in one go.
    #[must_use]
    pub fn from_rows<S: Into<String>>(
        column_names: impl IntoIterator<Item = S>,
        rows: Vec<Vec<RowValues>>,
    ) -> ResultSet {
        let mut rs = ResultSet::with_capacity(rows.len());
        rs.set_column_names(Arc::new(
            column_names.into_iter().map(Into::into).collect(),
        ));
        for row in rows {
            rs.add_row_values(row);
        }
        rs
    }

    /// Set the column names for this result set (to be shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(index_columns(&column_names));
        self.column_names = Some(column_names);
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row to the result set. Ignored until column names are set.
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        if let (Some(column_names), Some(column_index)) = (&self.column_names, &self.column_index)
        {
            self.results.push(CustomDbRow::with_index(
                column_names.clone(),
                column_index.clone(),
                row_values,
            ));
            self.rows_affected += 1;
        }
    }

    /// Add an already built row
    pub fn add_row(&mut self, row: CustomDbRow) {
        if self.column_names.is_none() {
            self.set_column_names(row.column_names.clone());
        }
        self.results.push(row);
        self.rows_affected += 1;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Keep at most `max` rows.
    pub fn truncate(&mut self, max: usize) {
        self.results.truncate(max);
    }

    /// The first row, consuming the set.
    #[must_use]
    pub fn into_first(self) -> Option<CustomDbRow> {
        self.results.into_iter().next()
    }

    /// Project one named column out of every row.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::ExecutionError` if a row lacks the column.
    pub fn pluck(self, column: &str) -> Result<Vec<RowValues>, SqlMiddlewareDbError> {
        self.results
            .into_iter()
            .map(|row| {
                row.take(column).ok_or_else(|| {
                    SqlMiddlewareDbError::ExecutionError(format!(
                        "column {column} is not in the result set"
                    ))
                })
            })
            .collect()
    }
}
