use sql_dialect_middleware::prelude::*;
use sql_dialect_middleware::test_utils::{MockEvent, MockPool};

fn client(pool: &MockPool) -> Client<MockPool> {
    Client::new(pool.clone(), ClientConfig::new(DatabaseType::Postgres))
}

fn debit() -> QueryRequest {
    QueryRequest::decrement("accounts", "balance", 10).where_eq("id", 1)
}

async fn settle_background_tasks() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn commit_releases_connection_once() -> Result<(), Box<dyn std::error::Error>> {
    let pool = MockPool::new();
    let client = client(&pool);

    let value = client
        .transaction(|tx| {
            Box::pin(async move {
                tx.run(debit()).await?;
                Ok(7)
            })
        })
        .await?;

    assert_eq!(value, 7);
    assert_eq!(pool.events()[0], MockEvent::Begin);
    assert_eq!(pool.events().last(), Some(&MockEvent::Commit));
    assert_eq!((pool.acquired(), pool.released(), pool.destroyed()), (1, 1, 0));
    Ok(())
}

#[tokio::test]
async fn failing_closure_rolls_back_and_returns_its_error() {
    let pool = MockPool::new();
    let client = client(&pool);

    let err = client
        .transaction(|tx| {
            Box::pin(async move {
                tx.run(debit()).await?;
                Err::<(), _>(SqlMiddlewareDbError::Other("insufficient funds".into()))
            })
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SqlMiddlewareDbError::Other(msg) if msg == "insufficient funds"));
    assert_eq!(pool.events().last(), Some(&MockEvent::Rollback));
    assert!(!pool.events().contains(&MockEvent::Commit));
    assert_eq!((pool.released(), pool.destroyed()), (1, 0));
}

#[tokio::test]
async fn failed_rollback_takes_precedence_and_destroys() {
    let pool = MockPool::new()
        .fail("update", DriverError::with_code(1, "constraint violated"))
        .fail_rollback(DriverError::new("connection reset"));
    let client = client(&pool);

    let err = client
        .transaction(|tx| {
            Box::pin(async move {
                tx.run(debit()).await?;
                Ok(())
            })
        })
        .await
        .unwrap_err();

    match err {
        SqlMiddlewareDbError::RollbackError(source) => {
            assert_eq!(source.message, "connection reset");
        }
        other => panic!("expected rollback error, got {other:?}"),
    }
    assert_eq!((pool.released(), pool.destroyed()), (0, 1));
    assert_eq!(pool.outstanding(), 0);
}

#[tokio::test]
async fn statement_error_surfaces_after_clean_rollback() {
    let pool = MockPool::new().fail("update", DriverError::with_code(1, "constraint violated"));
    let client = client(&pool);

    let err = client
        .transaction(|tx| Box::pin(async move { tx.run(debit()).await.map(|_| ()) }))
        .await
        .unwrap_err();

    let SqlMiddlewareDbError::StatementError { statement, source } = err else {
        panic!("expected statement error");
    };
    assert!(statement.starts_with(r#"update "accounts""#));
    assert_eq!(source.code, Some(1));
    assert_eq!((pool.released(), pool.destroyed()), (1, 0));
}

#[tokio::test]
async fn commit_failure_destroys_connection() {
    let pool = MockPool::new().fail_commit(DriverError::new("serialization failure"));
    let client = client(&pool);

    let err = client
        .transaction(|tx| {
            Box::pin(async move {
                tx.run(debit()).await?;
                Ok(())
            })
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SqlMiddlewareDbError::CommitError(_)));
    assert_eq!((pool.released(), pool.destroyed()), (0, 1));
}

#[tokio::test]
async fn begin_failure_never_leaks_a_connection() {
    let pool = MockPool::new().fail_begin(DriverError::new("too many connections"));
    let client = client(&pool);

    let err = client.begin().await.unwrap_err();
    assert!(matches!(
        err,
        SqlMiddlewareDbError::StatementError { ref statement, .. } if statement == "BEGIN"
    ));
    assert_eq!(pool.outstanding(), 0);
    assert_eq!(pool.destroyed(), 1);
}

#[tokio::test]
async fn acquire_failure_is_a_connection_error() {
    let pool = MockPool::new().fail_acquire("pool exhausted");
    let err = client(&pool).begin().await.unwrap_err();
    assert!(matches!(err, SqlMiddlewareDbError::ConnectionError(_)));
    assert!(pool.events().is_empty());
}

#[tokio::test]
async fn dropped_active_transaction_rolls_back_in_background() -> Result<(), SqlMiddlewareDbError> {
    let pool = MockPool::new();
    let client = client(&pool);

    let mut tx = client.begin().await?;
    tx.run(debit()).await?;
    drop(tx);
    settle_background_tasks().await;

    assert_eq!(pool.events().last(), Some(&MockEvent::Rollback));
    assert_eq!((pool.released(), pool.destroyed()), (1, 0));
    Ok(())
}

#[tokio::test]
async fn dropped_transaction_with_failing_rollback_is_destroyed() -> Result<(), SqlMiddlewareDbError> {
    let pool = MockPool::new().fail_rollback(DriverError::new("broken pipe"));
    let tx = client(&pool).begin().await?;
    drop(tx);
    settle_background_tasks().await;

    assert_eq!((pool.released(), pool.destroyed()), (0, 1));
    Ok(())
}

#[tokio::test]
async fn nested_scope_never_commits_on_the_driver() -> Result<(), SqlMiddlewareDbError> {
    let pool = MockPool::new();
    let client = client(&pool);

    let mut outer = client.begin().await?;
    {
        let mut inner = outer.nested()?;
        assert!(inner.is_nested());
        inner.run(debit()).await?;
        inner.commit(()).await?;
    }
    {
        let inner = outer.nested()?;
        let err = inner
            .rollback::<()>(SqlMiddlewareDbError::Other("inner".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, SqlMiddlewareDbError::Other(_)));
    }
    outer.commit(()).await?;

    let events = pool.events();
    assert_eq!(events.iter().filter(|e| **e == MockEvent::Commit).count(), 1);
    assert!(!events.contains(&MockEvent::Rollback));
    assert_eq!(pool.released(), 1);
    Ok(())
}

#[tokio::test]
async fn supplied_connection_issues_no_transaction_statements() -> Result<(), SqlMiddlewareDbError> {
    let pool = MockPool::new();
    let client = client(&pool);
    let mut conn = pool.detached_connection();

    let tx_out = {
        let mut tx = client.with_connection(&mut conn);
        tx.run(debit()).await?;
        tx.release("done")?
    };
    assert_eq!(tx_out, "done");

    assert!(
        pool.events()
            .iter()
            .all(|e| matches!(e, MockEvent::Execute { .. }))
    );
    assert_eq!((pool.acquired(), pool.released()), (0, 0));
    Ok(())
}

#[tokio::test]
async fn release_is_rejected_for_pooled_transactions() -> Result<(), SqlMiddlewareDbError> {
    let pool = MockPool::new();
    let tx = client(&pool).begin().await?;
    let err = tx.release(()).unwrap_err();
    assert!(matches!(err, SqlMiddlewareDbError::TransactionState(_)));

    settle_background_tasks().await;
    assert_eq!(pool.outstanding(), 0);
    Ok(())
}
