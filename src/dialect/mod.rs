//! Per-backend SQL policy.
//!
//! A [`DialectStrategy`] is plain data: one value per configured backend, built once and shared
//! read-only by every compile. The compiler and formatter branch on its policy enums instead of
//! being specialised per backend.

mod builtin;

use serde::{Deserialize, Serialize};

use crate::error::DriverError;
use crate::translation::PlaceholderStyle;
use crate::types::DatabaseType;

/// How an aliased column expression is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasStyle {
    /// `expr as alias`
    As,
    /// `expr alias`
    Space,
}

/// How boolean bindings reach the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanEncoding {
    Native,
    /// `true` binds as `1`, `false` as `0`.
    Integer,
}

/// How binary bindings reach the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryEncoding {
    Native,
    /// Lowercase hex text, for drivers without native binary binding.
    Hex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStrategy {
    /// `limit ? offset ?`. Some engines reject a bare `offset`, so they get `limit -1` first.
    LimitOffset { offset_requires_limit: bool },
    /// `offset ? rows fetch next ? rows only`
    OffsetFetch,
    /// Nested `rownum` wrapping.
    RowNum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturningStrategy {
    /// Trailing `returning <cols>`.
    Native,
    /// `output inserted.<col>` / `output deleted.<col>` ahead of the values/where clause.
    Output,
    /// `returning ROWID into ?` with an out-parameter, followed by a refetch by row id.
    OutParamRefetch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoIncrementStrategy {
    /// The column type itself carries identity semantics.
    Identity,
    /// A sequence plus a before-insert trigger fills the key.
    SequenceTrigger,
}

/// The two flavours of DDL failure that idempotent create/drop treat as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdlErrorKind {
    AlreadyExists,
    AlreadyAbsent,
}

/// Native column type names used by the schema compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNames {
    pub increments: &'static str,
    pub big_increments: &'static str,
    pub integer: &'static str,
    pub big_integer: &'static str,
    pub varchar: &'static str,
    pub text: &'static str,
    pub boolean: &'static str,
    pub float: &'static str,
    pub timestamp: &'static str,
    pub binary: &'static str,
}

/// Everything the formatter, compiler, and executor need to know about one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectStrategy {
    pub name: &'static str,
    pub database_type: DatabaseType,
    /// Opening and closing identifier quote characters.
    pub identifier_quote: (char, char),
    pub alias_style: AliasStyle,
    pub placeholder_style: PlaceholderStyle,
    pub boolean_encoding: BooleanEncoding,
    pub binary_encoding: BinaryEncoding,
    pub limit_strategy: LimitStrategy,
    pub returning_strategy: ReturningStrategy,
    pub auto_increment: AutoIncrementStrategy,
    /// Whether `drop table if exists` is understood natively.
    pub native_drop_if_exists: bool,
    /// Driver codes meaning "the object already exists".
    pub already_exists_codes: &'static [i32],
    /// Driver codes meaning "the object does not exist".
    pub already_absent_codes: &'static [i32],
    pub types: TypeNames,
}

impl DialectStrategy {
    /// The built-in strategy for a database type.
    #[must_use]
    pub fn for_database(db_type: DatabaseType) -> Self {
        match db_type {
            DatabaseType::Postgres => Self::postgres(),
            DatabaseType::Sqlite => Self::sqlite(),
            DatabaseType::Mssql => Self::mssql(),
            DatabaseType::Oracle => Self::oracle(),
        }
    }

    /// Render the placeholder for a 1-based binding index.
    #[must_use]
    pub fn placeholder(&self, index: usize) -> String {
        self.placeholder_style.token(index)
    }

    /// True when `err` is the "already exists"/"already absent" failure this dialect reports
    /// for `kind`, meaning an idempotent create/drop can treat it as success.
    #[must_use]
    pub fn is_ignorable_ddl_error(&self, kind: DdlErrorKind, err: &DriverError) -> bool {
        let codes = match kind {
            DdlErrorKind::AlreadyExists => self.already_exists_codes,
            DdlErrorKind::AlreadyAbsent => self.already_absent_codes,
        };
        err.code.is_some_and(|code| codes.contains(&code.abs()))
    }

    #[must_use]
    pub fn supports_native_returning(&self) -> bool {
        !matches!(self.returning_strategy, ReturningStrategy::OutParamRefetch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_ignores_only_its_own_codes() {
        let oracle = DialectStrategy::oracle();
        let exists = DriverError::with_code(955, "ORA-00955: name is already used");
        let missing_table = DriverError::with_code(942, "ORA-00942: table or view does not exist");
        let other = DriverError::with_code(1, "ORA-00001: unique constraint violated");

        assert!(oracle.is_ignorable_ddl_error(DdlErrorKind::AlreadyExists, &exists));
        assert!(!oracle.is_ignorable_ddl_error(DdlErrorKind::AlreadyAbsent, &exists));
        assert!(oracle.is_ignorable_ddl_error(DdlErrorKind::AlreadyAbsent, &missing_table));
        assert!(!oracle.is_ignorable_ddl_error(DdlErrorKind::AlreadyExists, &other));
        assert!(!oracle.is_ignorable_ddl_error(
            DdlErrorKind::AlreadyExists,
            &DriverError::new("no code")
        ));
    }

    #[test]
    fn sqlcode_sign_is_ignored() {
        let oracle = DialectStrategy::oracle();
        let err = DriverError::with_code(-2289, "sequence does not exist");
        assert!(oracle.is_ignorable_ddl_error(DdlErrorKind::AlreadyAbsent, &err));
    }

    #[test]
    fn for_database_picks_builtin() {
        assert_eq!(DialectStrategy::for_database(DatabaseType::Oracle).name, "oracle");
        assert_eq!(
            DialectStrategy::for_database(DatabaseType::Postgres).placeholder(3),
            "$3"
        );
        assert_eq!(DialectStrategy::for_database(DatabaseType::Sqlite).placeholder(3), "?");
    }
}
