use std::str::FromStr;

use crate::error::SqlMiddlewareDbError;
use crate::types::RowValues;

use super::QueryRequest;

/// Comparison operators accepted in a `where` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
}

impl CompareOp {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Like => "like",
            CompareOp::NotLike => "not like",
        }
    }
}

impl FromStr for CompareOp {
    type Err = SqlMiddlewareDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "=" => Ok(CompareOp::Eq),
            "<>" | "!=" => Ok(CompareOp::NotEq),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Lte),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Gte),
            "like" => Ok(CompareOp::Like),
            "not like" => Ok(CompareOp::NotLike),
            other => Err(SqlMiddlewareDbError::CompilationError(format!(
                "unknown comparison operator `{other}`"
            ))),
        }
    }
}

/// A node in the `where` tree.
#[derive(Debug, Clone)]
pub enum Predicate {
    Compare {
        column: String,
        op: CompareOp,
        value: RowValues,
    },
    In {
        column: String,
        values: Vec<RowValues>,
    },
    InSubquery {
        column: String,
        query: Box<QueryRequest>,
    },
    IsNull(String),
    NotNull(String),
    /// Verbatim SQL with neutral `?` placeholders. Identifiers inside are never re-quoted.
    Raw {
        sql: String,
        bindings: Vec<RowValues>,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    #[must_use]
    pub fn eq(column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        Predicate::Compare {
            column: column.into(),
            op: CompareOp::Eq,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<RowValues>) -> Self {
        Predicate::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn raw(sql: impl Into<String>, bindings: Vec<RowValues>) -> Self {
        Predicate::Raw {
            sql: sql.into(),
            bindings,
        }
    }

    #[must_use]
    pub fn in_list(column: impl Into<String>, values: Vec<RowValues>) -> Self {
        Predicate::In {
            column: column.into(),
            values,
        }
    }

    #[must_use]
    pub fn in_subquery(column: impl Into<String>, query: QueryRequest) -> Self {
        Predicate::InSubquery {
            column: column.into(),
            query: Box::new(query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_operators_loosely() {
        assert_eq!(">".parse::<CompareOp>().unwrap(), CompareOp::Gt);
        assert_eq!("!=".parse::<CompareOp>().unwrap(), CompareOp::NotEq);
        assert_eq!(" LIKE ".parse::<CompareOp>().unwrap(), CompareOp::Like);
        assert!("~~".parse::<CompareOp>().is_err());
    }
}
