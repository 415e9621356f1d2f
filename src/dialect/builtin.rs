use super::{
    AliasStyle, AutoIncrementStrategy, BinaryEncoding, BooleanEncoding, DialectStrategy,
    LimitStrategy, ReturningStrategy, TypeNames,
};
use crate::translation::PlaceholderStyle;
use crate::types::DatabaseType;

// ORA-00955 name already used, ORA-00942 table missing, ORA-02289 sequence missing,
// ORA-04080 trigger missing.
const ORACLE_ALREADY_EXISTS: &[i32] = &[955];
const ORACLE_ALREADY_ABSENT: &[i32] = &[942, 2289, 4080];

// 2714 object already exists, 3701 cannot drop (missing).
const MSSQL_ALREADY_EXISTS: &[i32] = &[2714];
const MSSQL_ALREADY_ABSENT: &[i32] = &[3701];

impl DialectStrategy {
    /// `PostgreSQL`: `$N` placeholders, native `returning`, `serial` identity.
    #[must_use]
    pub fn postgres() -> Self {
        Self {
            name: "postgres",
            database_type: DatabaseType::Postgres,
            identifier_quote: ('"', '"'),
            alias_style: AliasStyle::As,
            placeholder_style: PlaceholderStyle::Dollar,
            boolean_encoding: BooleanEncoding::Integer,
            binary_encoding: BinaryEncoding::Native,
            limit_strategy: LimitStrategy::LimitOffset {
                offset_requires_limit: false,
            },
            returning_strategy: ReturningStrategy::Native,
            auto_increment: AutoIncrementStrategy::Identity,
            native_drop_if_exists: true,
            already_exists_codes: &[],
            already_absent_codes: &[],
            types: TypeNames {
                increments: "serial primary key",
                big_increments: "bigserial primary key",
                integer: "integer",
                big_integer: "bigint",
                varchar: "varchar",
                text: "text",
                boolean: "boolean",
                float: "real",
                timestamp: "timestamptz",
                binary: "bytea",
            },
        }
    }

    /// `SQLite`: bare `?`, native `returning`, `autoincrement` identity.
    #[must_use]
    pub fn sqlite() -> Self {
        Self {
            name: "sqlite",
            database_type: DatabaseType::Sqlite,
            identifier_quote: ('"', '"'),
            alias_style: AliasStyle::As,
            placeholder_style: PlaceholderStyle::Question,
            boolean_encoding: BooleanEncoding::Integer,
            binary_encoding: BinaryEncoding::Native,
            limit_strategy: LimitStrategy::LimitOffset {
                offset_requires_limit: true,
            },
            returning_strategy: ReturningStrategy::Native,
            auto_increment: AutoIncrementStrategy::Identity,
            native_drop_if_exists: true,
            already_exists_codes: &[],
            already_absent_codes: &[],
            types: TypeNames {
                increments: "integer not null primary key autoincrement",
                big_increments: "integer not null primary key autoincrement",
                integer: "integer",
                big_integer: "bigint",
                varchar: "varchar",
                text: "text",
                boolean: "boolean",
                float: "float",
                timestamp: "datetime",
                binary: "blob",
            },
        }
    }

    /// SQL Server: `[ ]` quoting, `@pN`, `output inserted.*`, offset/fetch paging.
    #[must_use]
    pub fn mssql() -> Self {
        Self {
            name: "mssql",
            database_type: DatabaseType::Mssql,
            identifier_quote: ('[', ']'),
            alias_style: AliasStyle::As,
            placeholder_style: PlaceholderStyle::AtP,
            boolean_encoding: BooleanEncoding::Integer,
            binary_encoding: BinaryEncoding::Native,
            limit_strategy: LimitStrategy::OffsetFetch,
            returning_strategy: ReturningStrategy::Output,
            auto_increment: AutoIncrementStrategy::Identity,
            native_drop_if_exists: true,
            already_exists_codes: MSSQL_ALREADY_EXISTS,
            already_absent_codes: MSSQL_ALREADY_ABSENT,
            types: TypeNames {
                increments: "int identity(1,1) not null primary key",
                big_increments: "bigint identity(1,1) not null primary key",
                integer: "int",
                big_integer: "bigint",
                varchar: "nvarchar",
                text: "nvarchar(max)",
                boolean: "bit",
                float: "float",
                timestamp: "datetime2",
                binary: "varbinary(max)",
            },
        }
    }

    /// Oracle: `:N`, space aliasing, `rownum` paging, `ROWID` refetch, sequence + trigger keys.
    #[must_use]
    pub fn oracle() -> Self {
        Self {
            name: "oracle",
            database_type: DatabaseType::Oracle,
            identifier_quote: ('"', '"'),
            alias_style: AliasStyle::Space,
            placeholder_style: PlaceholderStyle::Colon,
            boolean_encoding: BooleanEncoding::Integer,
            binary_encoding: BinaryEncoding::Hex,
            limit_strategy: LimitStrategy::RowNum,
            returning_strategy: ReturningStrategy::OutParamRefetch,
            auto_increment: AutoIncrementStrategy::SequenceTrigger,
            native_drop_if_exists: false,
            already_exists_codes: ORACLE_ALREADY_EXISTS,
            already_absent_codes: ORACLE_ALREADY_ABSENT,
            types: TypeNames {
                increments: "integer not null primary key",
                big_increments: "number(20, 0) not null primary key",
                integer: "integer",
                big_integer: "number(20, 0)",
                varchar: "varchar2",
                text: "clob",
                boolean: "number(1, 0)",
                float: "float",
                timestamp: "timestamp",
                binary: "blob",
            },
        }
    }
}
