//! Structured query requests handed to the compiler.
//!
//! A request is immutable once handed over; the small builder methods here exist so tests and
//! callers can assemble one without a full DSL.

mod predicate;
mod schema;

use std::fmt;
use std::sync::Arc;

pub use predicate::{CompareOp, Predicate};
pub use schema::{ColumnDef, ColumnType, SchemaRequest};

use crate::error::SqlMiddlewareDbError;
use crate::pool::DriverResponse;
use crate::response::QueryOutput;
use crate::types::RowValues;

/// Operation kind; drives both compilation and response shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Select,
    /// Select projecting one named column from every row.
    Pluck,
    /// Select returning only the first row.
    First,
    Insert,
    Update,
    Delete,
    /// Update that adds to (or subtracts from) a numeric column.
    Counter,
    /// Schema statements.
    Schema,
}

impl Method {
    #[must_use]
    pub fn is_select(self) -> bool {
        matches!(self, Method::Select | Method::Pluck | Method::First)
    }

    #[must_use]
    pub fn is_dml(self) -> bool {
        matches!(
            self,
            Method::Insert | Method::Update | Method::Delete | Method::Counter
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub left: String,
    pub op: CompareOp,
    pub right: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// `column = column + amount`; a negative amount decrements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterOp {
    pub column: String,
    pub amount: i64,
}

/// Caller-supplied transform that replaces the normal response shaping.
pub type OutputTransform =
    Arc<dyn Fn(DriverResponse) -> Result<QueryOutput, SqlMiddlewareDbError> + Send + Sync>;

#[derive(Clone)]
pub struct QueryRequest {
    pub method: Method,
    pub table: String,
    pub columns: Vec<String>,
    pub distinct: bool,
    /// Insert rows; column order inside a row is irrelevant.
    pub rows: Vec<Vec<(String, RowValues)>>,
    /// Update assignments, rendered in order.
    pub assignments: Vec<(String, RowValues)>,
    pub counter: Option<CounterOp>,
    /// Top-level predicates, joined with `and`.
    pub predicates: Vec<Predicate>,
    pub joins: Vec<Join>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub returning: Option<Vec<String>>,
    pub pluck: Option<String>,
    /// `None` follows the client default.
    pub quote_identifiers: Option<bool>,
    pub output: Option<OutputTransform>,
}

impl fmt::Debug for QueryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryRequest")
            .field("method", &self.method)
            .field("table", &self.table)
            .field("columns", &self.columns)
            .field("distinct", &self.distinct)
            .field("rows", &self.rows)
            .field("assignments", &self.assignments)
            .field("counter", &self.counter)
            .field("predicates", &self.predicates)
            .field("joins", &self.joins)
            .field("order_by", &self.order_by)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("returning", &self.returning)
            .field("pluck", &self.pluck)
            .field("quote_identifiers", &self.quote_identifiers)
            .field("output", &self.output.as_ref().map(|_| "<transform>"))
            .finish()
    }
}

impl QueryRequest {
    fn new(method: Method, table: impl Into<String>) -> Self {
        Self {
            method,
            table: table.into(),
            columns: Vec::new(),
            distinct: false,
            rows: Vec::new(),
            assignments: Vec::new(),
            counter: None,
            predicates: Vec::new(),
            joins: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            returning: None,
            pluck: None,
            quote_identifiers: None,
            output: None,
        }
    }

    #[must_use]
    pub fn select(table: impl Into<String>) -> Self {
        Self::new(Method::Select, table)
    }

    #[must_use]
    pub fn first(table: impl Into<String>) -> Self {
        Self::new(Method::First, table)
    }

    #[must_use]
    pub fn pluck(table: impl Into<String>, column: impl Into<String>) -> Self {
        let mut req = Self::new(Method::Pluck, table);
        req.pluck = Some(column.into());
        req
    }

    #[must_use]
    pub fn insert<K: Into<String>>(
        table: impl Into<String>,
        rows: Vec<Vec<(K, RowValues)>>,
    ) -> Self {
        let mut req = Self::new(Method::Insert, table);
        req.rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|(k, v)| (k.into(), v)).collect())
            .collect();
        req
    }

    #[must_use]
    pub fn insert_one<K: Into<String>>(table: impl Into<String>, row: Vec<(K, RowValues)>) -> Self {
        Self::insert(table, vec![row])
    }

    #[must_use]
    pub fn update<K: Into<String>>(
        table: impl Into<String>,
        assignments: Vec<(K, RowValues)>,
    ) -> Self {
        let mut req = Self::new(Method::Update, table);
        req.assignments = assignments.into_iter().map(|(k, v)| (k.into(), v)).collect();
        req
    }

    #[must_use]
    pub fn delete(table: impl Into<String>) -> Self {
        Self::new(Method::Delete, table)
    }

    #[must_use]
    pub fn increment(table: impl Into<String>, column: impl Into<String>, amount: i64) -> Self {
        let mut req = Self::new(Method::Counter, table);
        req.counter = Some(CounterOp {
            column: column.into(),
            amount,
        });
        req
    }

    #[must_use]
    pub fn decrement(table: impl Into<String>, column: impl Into<String>, amount: i64) -> Self {
        // i64::MIN stays negative here and is rejected at compile time.
        Self::increment(table, column, amount.wrapping_neg())
    }

    #[must_use]
    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    #[must_use]
    pub fn where_eq(self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.filter(Predicate::eq(column, value))
    }

    #[must_use]
    pub fn where_op(
        self,
        column: impl Into<String>,
        op: CompareOp,
        value: impl Into<RowValues>,
    ) -> Self {
        self.filter(Predicate::compare(column, op, value))
    }

    #[must_use]
    pub fn where_in(self, column: impl Into<String>, values: Vec<RowValues>) -> Self {
        self.filter(Predicate::in_list(column, values))
    }

    #[must_use]
    pub fn where_in_subquery(self, column: impl Into<String>, query: QueryRequest) -> Self {
        self.filter(Predicate::in_subquery(column, query))
    }

    #[must_use]
    pub fn where_raw(self, sql: impl Into<String>, bindings: Vec<RowValues>) -> Self {
        self.filter(Predicate::raw(sql, bindings))
    }

    #[must_use]
    pub fn join(
        mut self,
        kind: JoinKind,
        table: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        self.joins.push(Join {
            kind,
            table: table.into(),
            left: left.into(),
            op: CompareOp::Eq,
            right: right.into(),
        });
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn returning<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.returning = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Override identifier quoting for this request.
    #[must_use]
    pub fn quote(mut self, enabled: bool) -> Self {
        self.quote_identifiers = Some(enabled);
        self
    }

    #[must_use]
    pub fn output<F>(mut self, transform: F) -> Self
    where
        F: Fn(DriverResponse) -> Result<QueryOutput, SqlMiddlewareDbError> + Send + Sync + 'static,
    {
        self.output = Some(Arc::new(transform));
        self
    }
}

/// Anything the compiler accepts.
#[derive(Debug, Clone)]
pub enum Request {
    Query(QueryRequest),
    Schema(SchemaRequest),
}

impl From<QueryRequest> for Request {
    fn from(value: QueryRequest) -> Self {
        Request::Query(value)
    }
}

impl From<SchemaRequest> for Request {
    fn from(value: SchemaRequest) -> Self {
        Request::Schema(value)
    }
}

impl Request {
    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Request::Query(query) => query.method,
            Request::Schema(_) => Method::Schema,
        }
    }

    #[must_use]
    pub fn output(&self) -> Option<&OutputTransform> {
        match self {
            Request::Query(query) => query.output.as_ref(),
            Request::Schema(_) => None,
        }
    }
}
