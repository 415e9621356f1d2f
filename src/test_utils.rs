//! Scripted in-memory pool and driver for tests.
//!
//! Statements are matched against rules by substring, first match wins; unmatched statements
//! succeed with no rows and zero affected. Every call is recorded so tests can assert the exact
//! statement order and how often connections were acquired, released, or destroyed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::compiled::DriverParam;
use crate::error::{DriverError, SqlMiddlewareDbError};
use crate::pool::{ConnectionPool, DriverConnection, DriverResponse};

/// One driver call seen by a [`MockConnection`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    Begin,
    Execute {
        sql: String,
        params: Vec<DriverParam>,
    },
    Commit,
    Rollback,
}

#[derive(Debug, Default)]
struct MockState {
    events: Vec<MockEvent>,
    rules: Vec<(String, Result<DriverResponse, DriverError>)>,
    begin_error: Option<DriverError>,
    commit_error: Option<DriverError>,
    rollback_error: Option<DriverError>,
    acquire_error: Option<String>,
    acquired: usize,
    released: usize,
    destroyed: usize,
}

/// Cloning shares the same script and recordings.
#[derive(Debug, Clone, Default)]
pub struct MockPool {
    state: Arc<Mutex<MockState>>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements containing `pattern` with `response`.
    #[must_use]
    pub fn respond(self, pattern: impl Into<String>, response: DriverResponse) -> Self {
        lock(&self.state).rules.push((pattern.into(), Ok(response)));
        self
    }

    /// Fail statements containing `pattern` with `error`.
    #[must_use]
    pub fn fail(self, pattern: impl Into<String>, error: DriverError) -> Self {
        lock(&self.state).rules.push((pattern.into(), Err(error)));
        self
    }

    #[must_use]
    pub fn fail_begin(self, error: DriverError) -> Self {
        lock(&self.state).begin_error = Some(error);
        self
    }

    #[must_use]
    pub fn fail_commit(self, error: DriverError) -> Self {
        lock(&self.state).commit_error = Some(error);
        self
    }

    #[must_use]
    pub fn fail_rollback(self, error: DriverError) -> Self {
        lock(&self.state).rollback_error = Some(error);
        self
    }

    #[must_use]
    pub fn fail_acquire(self, message: impl Into<String>) -> Self {
        lock(&self.state).acquire_error = Some(message.into());
        self
    }

    #[must_use]
    pub fn events(&self) -> Vec<MockEvent> {
        lock(&self.state).events.clone()
    }

    /// SQL text of every executed statement, in order.
    #[must_use]
    pub fn executed_sql(&self) -> Vec<String> {
        lock(&self.state)
            .events
            .iter()
            .filter_map(|event| match event {
                MockEvent::Execute { sql, .. } => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn acquired(&self) -> usize {
        lock(&self.state).acquired
    }

    #[must_use]
    pub fn released(&self) -> usize {
        lock(&self.state).released
    }

    #[must_use]
    pub fn destroyed(&self) -> usize {
        lock(&self.state).destroyed
    }

    /// Connections acquired but not yet released or destroyed.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        let state = lock(&self.state);
        state.acquired - state.released - state.destroyed
    }

    /// A connection that is not counted as acquired, for caller-owned scenarios.
    #[must_use]
    pub fn detached_connection(&self) -> MockConnection {
        MockConnection {
            state: Arc::clone(&self.state),
        }
    }
}

#[derive(Debug)]
pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    fn record(&self, event: MockEvent) {
        lock(&self.state).events.push(event);
    }
}

#[async_trait]
impl DriverConnection for MockConnection {
    async fn execute(
        &mut self,
        sql: &str,
        params: &[DriverParam],
    ) -> Result<DriverResponse, DriverError> {
        let mut state = lock(&self.state);
        state.events.push(MockEvent::Execute {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        state
            .rules
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map_or_else(|| Ok(DriverResponse::default()), |(_, outcome)| outcome.clone())
    }

    async fn begin(&mut self) -> Result<(), DriverError> {
        self.record(MockEvent::Begin);
        lock(&self.state).begin_error.clone().map_or(Ok(()), Err)
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        self.record(MockEvent::Commit);
        lock(&self.state).commit_error.clone().map_or(Ok(()), Err)
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        self.record(MockEvent::Rollback);
        lock(&self.state).rollback_error.clone().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl ConnectionPool for MockPool {
    type Connection = MockConnection;

    async fn acquire(&self) -> Result<MockConnection, SqlMiddlewareDbError> {
        let mut state = lock(&self.state);
        if let Some(message) = &state.acquire_error {
            return Err(SqlMiddlewareDbError::ConnectionError(message.clone()));
        }
        state.acquired += 1;
        Ok(MockConnection {
            state: Arc::clone(&self.state),
        })
    }

    fn release(&self, _conn: MockConnection) {
        lock(&self.state).released += 1;
    }

    async fn destroy(&self, _conn: MockConnection) {
        lock(&self.state).destroyed += 1;
    }
}
