use futures::FutureExt;
use log::info;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tx_runner::{TransactionError, TransactionRunner};

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("{owner} has insufficient funds: {balance} < {amount}")]
    InsufficientFunds {
        owner: String,
        balance: i64,
        amount: i64,
    },
    #[error("unknown account {0}")]
    UnknownAccount(String),
    #[error(transparent)]
    Database(#[from] tx_runner::Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

async fn balance(conn: &mut SqliteConnection, owner: &str) -> Result<i64, TransferError> {
    sqlx::query_scalar::<Sqlite, i64>("SELECT balance FROM account WHERE owner = ?")
        .bind(owner)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| TransferError::UnknownAccount(owner.to_string()))
}

async fn add(conn: &mut SqliteConnection, owner: &str, amount: i64) -> Result<(), TransferError> {
    sqlx::query("UPDATE account SET balance = balance + ? WHERE owner = ?")
        .bind(amount)
        .bind(owner)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn setup(runner: &TransactionRunner<'_, SqlitePool>) -> anyhow::Result<()> {
    runner
        .run(|tx| {
            async move {
                let conn = tx.connection()?;
                sqlx::query(
                    "CREATE TABLE IF NOT EXISTS account (owner TEXT PRIMARY KEY, balance INTEGER NOT NULL)",
                )
                .execute(&mut *conn)
                .await?;
                for owner in ["alice", "bob"] {
                    sqlx::query("INSERT OR REPLACE INTO account (owner, balance) VALUES (?, 100)")
                        .bind(owner)
                        .execute(&mut *conn)
                        .await?;
                }
                Ok::<_, TransferError>(())
            }
            .boxed()
        })
        .await?;
    Ok(())
}

async fn transfer(
    runner: &TransactionRunner<'_, SqlitePool>,
    from: &str,
    to: &str,
    amount: i64,
) -> Result<i64, TransactionError<TransferError, tx_runner::Error>> {
    let (from, to) = (from.to_string(), to.to_string());
    runner
        .run(move |tx| {
            async move {
                let conn = tx.connection()?;
                let sender_balance = balance(conn, &from).await?;
                if sender_balance < amount {
                    return Err(TransferError::InsufficientFunds {
                        owner: from,
                        balance: sender_balance,
                        amount,
                    });
                }
                // Unknown receivers fail below, after the sender was already charged
                add(conn, &from, -amount).await?;
                balance(conn, &to).await?;
                add(conn, &to, amount).await?;
                Ok::<_, TransferError>(sender_balance - amount)
            }
            .boxed()
        })
        .await
}

async fn print_balances(pool: &SqlitePool) -> anyhow::Result<()> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT owner, balance FROM account ORDER BY owner")
            .fetch_all(pool)
            .await?;
    for (owner, balance) in rows {
        info!("{owner}: {balance}");
        println!("{owner}: {balance}");
    }
    Ok(())
}

pub async fn operate(
    pool: &SqlitePool,
    runner: &TransactionRunner<'_, SqlitePool>,
) -> anyhow::Result<()> {
    setup(runner).await?;

    let left = transfer(runner, "alice", "bob", 30).await?;
    println!("alice has {left} left after the transfer");

    // Rolled back: violates the business rule
    match transfer(runner, "alice", "bob", 1000).await {
        Err(err) if err.work_error().is_some() => println!("transfer rejected: {err}"),
        other => anyhow::bail!("expected the transfer to be rejected, got {other:?}"),
    }

    // Rolled back: the sender was already charged when the receiver turned out to be unknown
    match transfer(runner, "bob", "mallory", 10).await {
        Err(err) if err.work_error().is_some() => println!("transfer rejected: {err}"),
        other => anyhow::bail!("expected the transfer to be rejected, got {other:?}"),
    }

    print_balances(pool).await
}
