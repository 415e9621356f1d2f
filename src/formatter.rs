
use lazy_static::lazy_static;
use regex::Regex;

use crate::compiled::{BindDirection, Binding, DriverParam, OutParam, OutParamType};
use crate::dialect::{AliasStyle, BinaryEncoding, BooleanEncoding, DialectStrategy};
use crate::types::RowValues;

lazy_static! {
    // `<expr> as <alias>`, any case, any surrounding whitespace.
    static ref ALIAS_MARKER: Regex =
        Regex::new(r"(?i)^\s*(\S+)\s+as\s+(\S+)\s*$").expect("alias pattern is valid");
}

/// Encodes values and identifiers for one dialect and one quoting setting.
#[derive(Debug, Clone, Copy)]
pub struct Formatter<'d> {
    dialect: &'d DialectStrategy,
    quoting: bool,
}

impl<'d> Formatter<'d> {
    #[must_use]
    pub fn new(dialect: &'d DialectStrategy, quoting: bool) -> Self {
        Self { dialect, quoting }
    }

    #[must_use]
    pub fn dialect(&self) -> &'d DialectStrategy {
        self.dialect
    }

    #[must_use]
    pub fn quoting(&self) -> bool {
        self.quoting
    }

    /// Encode a binding together with its positioned placeholder token.
    #[must_use]
    pub fn encode_value(&self, binding: &Binding, index: usize) -> (DriverParam, String) {
        encode_value(binding, index, self.dialect)
    }

    /// Encode every binding of a statement, in order.
    #[must_use]
    pub fn encode_bindings(&self, bindings: &[Binding]) -> Vec<DriverParam> {
        bindings
            .iter()
            .enumerate()
            .map(|(i, binding)| self.encode_value(binding, i + 1).0)
            .collect()
    }

    /// Wrap an identifier (possibly dotted) in the dialect's quote characters.
    #[must_use]
    pub fn identifier(&self, name: &str) -> String {
        encode_identifier(name, self.dialect, self.quoting)
    }

    /// Render a select-list expression, re-rendering a case-insensitive ` as ` alias marker in
    /// the dialect's alias style.
    #[must_use]
    pub fn column_expr(&self, expr: &str) -> String {
        if let Some(caps) = ALIAS_MARKER.captures(expr) {
            let first = self.identifier(&caps[1]);
            let second = self.identifier(&caps[2]);
            return self.alias(&first, &second);
        }
        self.identifier(expr.trim())
    }

    /// Join two already-rendered pieces with the dialect's alias syntax.
    #[must_use]
    pub fn alias(&self, first: &str, second: &str) -> String {
        match self.dialect.alias_style {
            AliasStyle::As => format!("{first} as {second}"),
            AliasStyle::Space => format!("{first} {second}"),
        }
    }

    /// Comma-separated select list.
    #[must_use]
    pub fn columnize<S: AsRef<str>>(&self, columns: &[S]) -> String {
        if columns.is_empty() {
            return "*".to_string();
        }
        columns
            .iter()
            .map(|c| self.column_expr(c.as_ref()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Encode one binding for `dialect`, returning the driver value and its placeholder token.
///
/// A [`Binding::Returning`] placeholder becomes an out-parameter descriptor (direction out,
/// string typed) that keeps the placeholder's logical column. Booleans and binary payloads
/// follow the dialect's encodings; everything else passes through.
#[must_use]
pub fn encode_value(
    binding: &Binding,
    index: usize,
    dialect: &DialectStrategy,
) -> (DriverParam, String) {
    let token = dialect.placeholder(index);
    let param = match binding {
        Binding::Returning(placeholder) => DriverParam::Out(OutParam {
            name: placeholder.out_bind_name(),
            direction: BindDirection::Out,
            kind: OutParamType::String,
            column: placeholder.column.clone(),
        }),
        Binding::Value(RowValues::Bool(b))
            if dialect.boolean_encoding == BooleanEncoding::Integer =>
        {
            DriverParam::In(RowValues::Int(i64::from(*b)))
        }
        Binding::Value(RowValues::Blob(bytes)) if dialect.binary_encoding == BinaryEncoding::Hex => {
            DriverParam::In(RowValues::Text(hex_encode(bytes)))
        }
        Binding::Value(value) => DriverParam::In(value.clone()),
    };
    (param, token)
}

/// Wrap `name` in the dialect's identifier quotes when `quoting` is on.
///
/// Dotted names wrap each segment and `*` is never wrapped. With quoting off the name passes
/// through untouched, so the backend's own case folding applies to it.
#[must_use]
pub fn encode_identifier(name: &str, dialect: &DialectStrategy, quoting: bool) -> String {
    if !quoting {
        return name.to_string();
    }
    name.split('.')
        .map(|segment| wrap_segment(segment, dialect))
        .collect::<Vec<_>>()
        .join(".")
}

fn wrap_segment(segment: &str, dialect: &DialectStrategy) -> String {
    if segment == "*" {
        return segment.to_string();
    }
    let (open, close) = dialect.identifier_quote;
    let mut out = String::with_capacity(segment.len() + 2);
    out.push(open);
    for ch in segment.chars() {
        if ch == close {
            out.push(close);
        }
        out.push(ch);
    }
    out.push(close);
    out
}

/// Single-quote a string literal for embedding in DDL text.
#[must_use]
pub fn escape_string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
