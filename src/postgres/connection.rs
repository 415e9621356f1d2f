use async_trait::async_trait;
use deadpool_postgres::Object;
use tokio_postgres::types::ToSql;

use super::params::convert;
use super::query::build_result_set;
use crate::compiled::DriverParam;
use crate::error::DriverError;
use crate::pool::{DriverConnection, DriverResponse};

/// A pooled tokio-postgres client.
pub struct PostgresConnection {
    client: Object,
}

impl std::fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

/// Keep the server's SQLSTATE; `PostgreSQL` has no numeric error codes.
pub(crate) fn driver_error(err: &tokio_postgres::Error) -> DriverError {
    let message = match err.as_db_error() {
        Some(db) => format!("{}: {}", db.severity(), db.message()),
        None => err.to_string(),
    };
    let driver = DriverError::new(message);
    match err.code() {
        Some(state) => driver.with_sqlstate(state.code()),
        None => driver,
    }
}

impl PostgresConnection {
    pub(crate) fn new(client: Object) -> Self {
        Self { client }
    }

    pub(crate) fn into_inner(self) -> Object {
        self.client
    }

    async fn batch(&mut self, sql: &str) -> Result<(), DriverError> {
        self.client
            .batch_execute(sql)
            .await
            .map_err(|e| driver_error(&e))
    }
}

#[async_trait]
impl DriverConnection for PostgresConnection {
    async fn execute(
        &mut self,
        sql: &str,
        params: &[DriverParam],
    ) -> Result<DriverResponse, DriverError> {
        let values = convert(params)?;
        let refs: Vec<&(dyn ToSql + Sync)> = values
            .iter()
            .map(|v| *v as &(dyn ToSql + Sync))
            .collect();

        let stmt = self
            .client
            .prepare_cached(sql)
            .await
            .map_err(|e| driver_error(&e))?;

        if stmt.columns().is_empty() {
            let affected = self
                .client
                .execute(&stmt, &refs)
                .await
                .map_err(|e| driver_error(&e))?;
            let affected = usize::try_from(affected)
                .map_err(|e| DriverError::new(format!("Invalid rows affected count: {e}")))?;
            Ok(DriverResponse::affected(affected))
        } else {
            let rows = self
                .client
                .query(&stmt, &refs)
                .await
                .map_err(|e| driver_error(&e))?;
            let result_set = build_result_set(&stmt, &rows).map_err(|e| driver_error(&e))?;
            Ok(DriverResponse::rows(result_set))
        }
    }

    async fn begin(&mut self) -> Result<(), DriverError> {
        self.batch("BEGIN").await
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        self.batch("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        self.batch("ROLLBACK").await
    }
}
