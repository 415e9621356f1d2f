use crate::dialect::DdlErrorKind;
use crate::request::Method;
use crate::types::RowValues;

/// Stand-in for a value the dialect cannot return inline from a DML statement.
///
/// `column` is the logical column (or `:`-joined column list) the placeholder represents;
/// `ordinal` orders placeholders within one statement and names the driver out-bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturningPlaceholder {
    pub column: String,
    pub ordinal: usize,
}

impl ReturningPlaceholder {
    /// Name of the driver out-bind this placeholder is read back from:
    /// `returnParam`, `returnParam1`, `returnParam2`, ...
    #[must_use]
    pub fn out_bind_name(&self) -> String {
        if self.ordinal == 0 {
            "returnParam".to_string()
        } else {
            format!("returnParam{}", self.ordinal)
        }
    }
}

impl std::fmt::Display for ReturningPlaceholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[ReturningPlaceholder:{}]", self.column)
    }
}

/// One logical binding as produced by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Value(RowValues),
    Returning(ReturningPlaceholder),
}

impl From<RowValues> for Binding {
    fn from(value: RowValues) -> Self {
        Binding::Value(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutParamType {
    String,
}

/// Driver-level out-parameter descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutParam {
    pub name: String,
    pub direction: BindDirection,
    pub kind: OutParamType,
    /// Logical column the out value stands for.
    pub column: String,
}

/// A binding in the shape the driver receives it.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverParam {
    In(RowValues),
    Out(OutParam),
}

impl DriverParam {
    #[must_use]
    pub fn as_value(&self) -> Option<&RowValues> {
        match self {
            DriverParam::In(value) => Some(value),
            DriverParam::Out(_) => None,
        }
    }
}

/// Follow-up select that fetches the returning payload by row identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryStatement {
    /// Positioned SQL text.
    pub sql: String,
    /// Out-bind names, in the order their values bind into `sql`.
    pub row_id_params: Vec<String>,
}

/// Output of the compiler for one statement. Consumed once by the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    /// Positioned SQL text.
    pub sql: String,
    pub bindings: Vec<Binding>,
    pub method: Method,
    pub returning: Option<Vec<String>>,
    pub secondary: Option<SecondaryStatement>,
    pub pluck: Option<String>,
    /// DDL failure this statement may swallow, checked against the dialect's codes.
    pub tolerates: Option<DdlErrorKind>,
}

impl CompiledStatement {
    #[must_use]
    pub fn new(sql: String, bindings: Vec<Binding>, method: Method) -> Self {
        Self {
            sql,
            bindings,
            method,
            returning: None,
            secondary: None,
            pluck: None,
            tolerates: None,
        }
    }

    /// Ordinary values only, with returning placeholders skipped.
    #[must_use]
    pub fn values(&self) -> Vec<&RowValues> {
        self.bindings
            .iter()
            .filter_map(|binding| match binding {
                Binding::Value(value) => Some(value),
                Binding::Returning(_) => None,
            })
            .collect()
    }

    #[must_use]
    pub fn returning_placeholders(&self) -> Vec<&ReturningPlaceholder> {
        self.bindings
            .iter()
            .filter_map(|binding| match binding {
                Binding::Returning(placeholder) => Some(placeholder),
                Binding::Value(_) => None,
            })
            .collect()
    }
}

/// What one request compiles to: a single statement, or an ordered schema sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledQuery {
    Single(CompiledStatement),
    Sequence(Vec<CompiledStatement>),
}

impl CompiledQuery {
    #[must_use]
    pub fn statements(&self) -> &[CompiledStatement] {
        match self {
            CompiledQuery::Single(stmt) => std::slice::from_ref(stmt),
            CompiledQuery::Sequence(stmts) => stmts,
        }
    }

    /// SQL text of every statement, in execution order.
    #[must_use]
    pub fn sql(&self) -> Vec<&str> {
        self.statements().iter().map(|s| s.sql.as_str()).collect()
    }

    /// The single statement, or `None` for a sequence.
    #[must_use]
    pub fn as_single(&self) -> Option<&CompiledStatement> {
        match self {
            CompiledQuery::Single(stmt) => Some(stmt),
            CompiledQuery::Sequence(_) => None,
        }
    }
}
