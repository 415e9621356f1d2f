use std::error::Error;

use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

use crate::compiled::DriverParam;
use crate::error::DriverError;
use crate::types::RowValues;

/// Borrow the input values; `PostgreSQL` returns natively, so out-parameters are refused.
pub(crate) fn convert(params: &[DriverParam]) -> Result<Vec<&RowValues>, DriverError> {
    params
        .iter()
        .map(|param| match param {
            DriverParam::In(value) => Ok(value),
            DriverParam::Out(out) => Err(DriverError::new(format!(
                "postgres does not support out-parameter {}",
                out.name
            ))),
        })
        .collect()
}

impl ToSql for RowValues {
    // Booleans arrive as 0/1, so integers have to bind into bool (and narrower int) columns.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            RowValues::Int(i) => match *ty {
                Type::BOOL => (*i != 0).to_sql_checked(ty, out),
                Type::INT2 => i16::try_from(*i)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql_checked(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql_checked(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql_checked(ty, out),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                    i.to_string().to_sql_checked(ty, out)
                }
                _ => (*i).to_sql_checked(ty, out),
            },
            RowValues::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql_checked(ty, out),
                _ => (*f).to_sql_checked(ty, out),
            },
            RowValues::Text(s) => s.to_sql_checked(ty, out),
            RowValues::Bool(b) => (*b).to_sql_checked(ty, out),
            RowValues::Timestamp(dt) => match *ty {
                Type::TIMESTAMPTZ => dt.and_utc().to_sql_checked(ty, out),
                _ => dt.to_sql_checked(ty, out),
            },
            RowValues::Null => Ok(IsNull::Yes),
            RowValues::JSON(jsval) => jsval.to_sql_checked(ty, out),
            RowValues::Blob(bytes) => bytes.to_sql_checked(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::BOOL
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::JSON
                | Type::JSONB
                | Type::BYTEA
        )
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_booleans_bind_into_bool_columns() {
        let mut buf = bytes::BytesMut::new();
        let res = RowValues::Int(1).to_sql(&Type::BOOL, &mut buf).unwrap();
        assert!(matches!(res, IsNull::No));
        assert_eq!(&buf[..], &[1]);
    }

    #[test]
    fn out_of_range_narrowing_fails() {
        let mut buf = bytes::BytesMut::new();
        assert!(RowValues::Int(i64::MAX).to_sql(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn text_into_integer_column_is_a_type_error() {
        let mut buf = bytes::BytesMut::new();
        assert!(
            RowValues::Text("x".into())
                .to_sql(&Type::INT4, &mut buf)
                .is_err()
        );
    }
}
