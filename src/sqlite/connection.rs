use async_trait::async_trait;
use deadpool::managed::Object;
use tokio::task::spawn_blocking;

use super::config::SqliteManager;
use super::params::{convert, driver_error};
use super::query::build_result_set;
use crate::compiled::DriverParam;
use crate::error::DriverError;
use crate::pool::{DriverConnection, DriverResponse};

/// A pooled rusqlite connection.
///
/// rusqlite calls block, so every statement runs on tokio's blocking pool. The connection is
/// moved into the blocking task and handed back when it finishes.
pub struct SqliteConnection {
    conn: Option<Object<SqliteManager>>,
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("autocommit", &self.conn.as_ref().map(|c| c.is_autocommit()))
            .finish()
    }
}

impl SqliteConnection {
    pub(crate) fn new(conn: Object<SqliteManager>) -> Self {
        Self { conn: Some(conn) }
    }

    /// `None` once a blocking task panicked and took the connection with it.
    pub(crate) fn into_inner(self) -> Option<Object<SqliteManager>> {
        self.conn
    }

    async fn run_blocking<F, R>(&mut self, func: F) -> Result<R, DriverError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, DriverError> + Send + 'static,
        R: Send + 'static,
    {
        let mut conn = self
            .conn
            .take()
            .ok_or_else(|| DriverError::new("sqlite connection was lost by a failed blocking task"))?;
        let (conn, result) = spawn_blocking(move || {
            let result = func(&mut conn);
            (conn, result)
        })
        .await
        .map_err(|e| DriverError::new(format!("sqlite spawn_blocking join error: {e}")))?;
        self.conn = Some(conn);
        result
    }

    async fn batch(&mut self, sql: &'static str) -> Result<(), DriverError> {
        self.run_blocking(move |conn| conn.execute_batch(sql).map_err(driver_error))
            .await
    }
}

#[async_trait]
impl DriverConnection for SqliteConnection {
    async fn execute(
        &mut self,
        sql: &str,
        params: &[DriverParam],
    ) -> Result<DriverResponse, DriverError> {
        let values = convert(params)?;
        let sql = sql.to_string();
        self.run_blocking(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(driver_error)?;
            if stmt.column_count() > 0 {
                let result_set = build_result_set(&mut stmt, &values).map_err(driver_error)?;
                Ok(DriverResponse::rows(result_set))
            } else {
                let affected = stmt
                    .execute(rusqlite::params_from_iter(values.iter()))
                    .map_err(driver_error)?;
                Ok(DriverResponse::affected(affected))
            }
        })
        .await
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ConnectionPool;
    use crate::sqlite::SqlitePool;
    use crate::types::RowValues;

    // block_in_place panics on a current-thread runtime; spawn_blocking does not.
    #[tokio::test(flavor = "current_thread")]
    async fn statements_run_off_the_runtime_thread() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let pool = SqlitePool::new(dir.path().join("blocking.db"), 1)?;
        let mut conn = pool.acquire().await?;

        conn.execute("create table t (id integer primary key, v text)", &[])
            .await?;

        conn.begin().await?;
        let inserted = conn
            .execute(
                "insert into t (v) values (?)",
                &[DriverParam::In(RowValues::Text("a".into()))],
            )
            .await?;
        assert_eq!(inserted.rows_affected, 1);
        conn.commit().await?;

        let rows = conn.execute("select v from t", &[]).await?;
        assert_eq!(
            rows.result_set.results[0].get("v"),
            Some(&RowValues::Text("a".into()))
        );
        pool.release(conn);
        Ok(())
    }
}
