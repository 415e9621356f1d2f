use rusqlite::types::Value;

use crate::compiled::DriverParam;
use crate::error::DriverError;
use crate::types::RowValues;

/// Convert a single `RowValue` to a rusqlite `Value`.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Convert driver parameters. `SQLite` returns natively, so out-parameters are refused.
pub(crate) fn convert(params: &[DriverParam]) -> Result<Vec<Value>, DriverError> {
    params
        .iter()
        .map(|param| match param {
            DriverParam::In(value) => Ok(row_value_to_sqlite_value(value)),
            DriverParam::Out(out) => Err(DriverError::new(format!(
                "sqlite does not support out-parameter {}",
                out.name
            ))),
        })
        .collect()
}

/// Map a rusqlite failure, keeping the extended result code.
pub(crate) fn driver_error(err: rusqlite::Error) -> DriverError {
    match &err {
        rusqlite::Error::SqliteFailure(code, _) => {
            DriverError::with_code(code.extended_code, err.to_string())
        }
        _ => DriverError::new(err.to_string()),
    }
}
