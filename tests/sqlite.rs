use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tx_runner::{
    with_transaction, Database, Error, RollbackError, Transaction, TransactionError,
    TransactionRunner,
};

async fn setup() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query("CREATE TABLE account (owner TEXT PRIMARY KEY, balance INTEGER NOT NULL)")
        .execute(&pool)
        .await
        .unwrap();
    pool
}

async fn count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM account")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[derive(Debug, thiserror::Error)]
enum TransferError {
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error(transparent)]
    Database(#[from] Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[tokio::test]
async fn commits_inserted_rows() {
    let pool = setup().await;

    let inserted = with_transaction(&pool, |tx| {
        async move {
            let result = sqlx::query("INSERT INTO account (owner, balance) VALUES (?, ?)")
                .bind("alice")
                .bind(100_i64)
                .execute(tx.connection()?)
                .await?;
            Ok::<_, Error>(result.rows_affected())
        }
        .boxed()
    })
    .await
    .unwrap();

    assert_eq!(inserted, 1);
    assert_eq!(count(&pool).await, 1);
}

#[tokio::test]
async fn rolls_back_on_work_error() {
    let pool = setup().await;

    let result = TransactionRunner::new(&pool)
        .run(|tx| {
            async move {
                sqlx::query("INSERT INTO account (owner, balance) VALUES ('bob', 5)")
                    .execute(tx.connection()?)
                    .await?;
                Err::<(), _>(TransferError::InsufficientFunds)
            }
            .boxed()
        })
        .await;

    assert!(matches!(
        result,
        Err(TransactionError::Work(TransferError::InsufficientFunds))
    ));
    assert_eq!(count(&pool).await, 0);
}

fn explode() -> Result<(), Error> {
    panic!("unit of work exploded")
}

#[tokio::test]
async fn rolls_back_on_panic() {
    let pool = setup().await;

    let result = AssertUnwindSafe(with_transaction(&pool, |tx| {
        async move {
            sqlx::query("INSERT INTO account (owner, balance) VALUES ('carol', 1)")
                .execute(tx.connection()?)
                .await?;
            explode()?;
            Ok::<_, Error>(())
        }
        .boxed()
    }))
    .catch_unwind()
    .await;

    assert!(result.is_err());
    assert_eq!(count(&pool).await, 0);
}

#[tokio::test]
async fn finished_transaction_is_reported() {
    let pool = setup().await;

    let mut tx = pool.begin_transaction().await.unwrap();
    tx.commit().await.unwrap();

    assert!(tx.is_finished());
    assert!(matches!(tx.connection(), Err(Error::TransactionFinished)));
    assert!(matches!(tx.commit().await, Err(Error::TransactionFinished)));
    assert!(matches!(
        tx.rollback().await,
        Err(RollbackError::AlreadyFinished)
    ));
}
