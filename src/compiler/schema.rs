use crate::compiled::{CompiledQuery, CompiledStatement};
use crate::dialect::{AutoIncrementStrategy, DdlErrorKind};
use crate::error::SqlMiddlewareDbError;
use crate::formatter::Formatter;
use crate::request::{ColumnDef, ColumnType, Method, SchemaRequest};

pub(crate) fn compile_schema(
    fmt: &Formatter<'_>,
    request: &SchemaRequest,
) -> Result<CompiledQuery, SqlMiddlewareDbError> {
    match request {
        SchemaRequest::CreateTable { table, columns, .. } => create_table(fmt, table, columns),
        SchemaRequest::DropTable {
            table, if_exists, ..
        } => drop_table(fmt, table, *if_exists),
    }
}

fn ddl(sql: String) -> CompiledStatement {
    CompiledStatement::new(sql, Vec::new(), Method::Schema)
}

fn tolerant_ddl(sql: String, kind: DdlErrorKind) -> CompiledStatement {
    let mut stmt = ddl(sql);
    stmt.tolerates = Some(kind);
    stmt
}

fn sequence_name(table: &str) -> String {
    format!("{table}_seq")
}

fn create_table(
    fmt: &Formatter<'_>,
    table: &str,
    columns: &[ColumnDef],
) -> Result<CompiledQuery, SqlMiddlewareDbError> {
    if table.trim().is_empty() {
        return Err(SqlMiddlewareDbError::CompilationError(
            "create table has no name".to_string(),
        ));
    }
    if columns.is_empty() {
        return Err(SqlMiddlewareDbError::CompilationError(format!(
            "create table {table} has no columns"
        )));
    }

    let column_sql = columns
        .iter()
        .map(|c| column_definition(fmt, c))
        .collect::<Vec<_>>()
        .join(", ");
    let table_ident = fmt.identifier(table);
    let create = ddl(format!("create table {table_ident} ({column_sql})"));

    let auto_increment = columns.iter().find(|c| c.column_type.is_auto_increment());
    match (fmt.dialect().auto_increment, auto_increment) {
        (AutoIncrementStrategy::SequenceTrigger, Some(key)) => {
            let sequence = fmt.identifier(&sequence_name(table));
            let trigger = fmt.identifier(&format!("{table}_{}_trg", key.name));
            let key_ident = fmt.identifier(&key.name);
            Ok(CompiledQuery::Sequence(vec![
                create,
                tolerant_ddl(
                    format!("create sequence {sequence}"),
                    DdlErrorKind::AlreadyExists,
                ),
                ddl(format!(
                    "create or replace trigger {trigger} before insert on {table_ident} \
                     for each row when (new.{key_ident} is null) \
                     begin select {sequence}.nextval into :new.{key_ident} from dual; end;"
                )),
            ]))
        }
        _ => Ok(CompiledQuery::Single(create)),
    }
}

fn column_definition(fmt: &Formatter<'_>, column: &ColumnDef) -> String {
    let types = &fmt.dialect().types;
    let native = match column.column_type {
        ColumnType::Increments => types.increments.to_string(),
        ColumnType::BigIncrements => types.big_increments.to_string(),
        ColumnType::Integer => types.integer.to_string(),
        ColumnType::BigInteger => types.big_integer.to_string(),
        ColumnType::String(len) => format!("{}({len})", types.varchar),
        ColumnType::Text => types.text.to_string(),
        ColumnType::Boolean => types.boolean.to_string(),
        ColumnType::Float => types.float.to_string(),
        ColumnType::Timestamp => types.timestamp.to_string(),
        ColumnType::Binary => types.binary.to_string(),
    };
    let nullability = match column.nullable {
        Some(true) => " null",
        Some(false) => " not null",
        None => "",
    };
    format!("{} {native}{nullability}", fmt.identifier(&column.name))
}

fn drop_table(
    fmt: &Formatter<'_>,
    table: &str,
    if_exists: bool,
) -> Result<CompiledQuery, SqlMiddlewareDbError> {
    if table.trim().is_empty() {
        return Err(SqlMiddlewareDbError::CompilationError(
            "drop table has no name".to_string(),
        ));
    }
    let dialect = fmt.dialect();
    let table_ident = fmt.identifier(table);

    let drop = match (if_exists, dialect.native_drop_if_exists) {
        (true, true) => ddl(format!("drop table if exists {table_ident}")),
        (true, false) => tolerant_ddl(
            format!("drop table {table_ident}"),
            DdlErrorKind::AlreadyAbsent,
        ),
        (false, _) => ddl(format!("drop table {table_ident}")),
    };

    if dialect.auto_increment == AutoIncrementStrategy::SequenceTrigger {
        // The trigger goes with the table; the sequence has to be dropped on its own.
        let sequence = fmt.identifier(&sequence_name(table));
        return Ok(CompiledQuery::Sequence(vec![
            drop,
            tolerant_ddl(
                format!("drop sequence {sequence}"),
                DdlErrorKind::AlreadyAbsent,
            ),
        ]));
    }
    Ok(CompiledQuery::Single(drop))
}
