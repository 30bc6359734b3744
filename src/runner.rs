use std::fmt::Arguments;
use std::panic::{resume_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;
use log::{log, Level, LevelFilter};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::{RollbackError, TransactionError};
use crate::transaction::Transaction;

/**
All transactions that take longer than this value from begin to resolution
are considered as slow transactions.
*/
const SLOW_TRANSACTIONS: Duration = Duration::from_millis(300);

/**
Configuration of a [TransactionRunner].

It only controls logging, the commit and rollback behaviour is always the same.
 */
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RunnerConfiguration {
    /// If set to true, logging will be completely disabled.
    ///
    /// In case of None, false will be used.
    pub disable_logging: Option<bool>,
    /// Log level of begin, commit and rollback.
    ///
    /// In case of None, [LevelFilter::Debug] will be used.
    pub lifecycle_log_level: Option<LevelFilter>,
    /// Log level in case of slow transactions.
    ///
    /// In case of None, [LevelFilter::Warn] will be used.
    pub slow_transaction_log_level: Option<LevelFilter>,
    /// Duration in milliseconds after which a transaction counts as slow.
    ///
    /// In case of None, 300 ms will be used.
    pub slow_transaction_threshold_ms: Option<u64>,
}

impl RunnerConfiguration {
    /**
    Create a new runner configuration with the defaults set.

    **Defaults**:
    - `disable_logging`: [Some] of `false`
    - `lifecycle_log_level`: [Some] of [LevelFilter::Debug]
    - `slow_transaction_log_level`: [Some] of [LevelFilter::Warn]
    - `slow_transaction_threshold_ms`: [Some] of `300`
    */
    pub fn new() -> Self {
        RunnerConfiguration {
            disable_logging: Some(false),
            lifecycle_log_level: Some(LevelFilter::Debug),
            slow_transaction_log_level: Some(LevelFilter::Warn),
            slow_transaction_threshold_ms: Some(SLOW_TRANSACTIONS.as_millis() as u64),
        }
    }

    fn lifecycle_level(&self) -> Option<Level> {
        self.level(self.lifecycle_log_level.unwrap_or(LevelFilter::Debug))
    }

    fn slow_level(&self) -> Option<Level> {
        self.level(self.slow_transaction_log_level.unwrap_or(LevelFilter::Warn))
    }

    fn level(&self, filter: LevelFilter) -> Option<Level> {
        if self.disable_logging.unwrap_or(false) {
            None
        } else {
            filter.to_level()
        }
    }

    fn slow_threshold(&self) -> Duration {
        self.slow_transaction_threshold_ms
            .map(Duration::from_millis)
            .unwrap_or(SLOW_TRANSACTIONS)
    }
}

/// What went wrong before the rollback attempt.
enum Failure<E, D> {
    Work(E),
    Commit(D),
}

/**
Runs units of work in transactions of a [Database].

The transaction is committed if the work succeeds.
It is rolled back if the work returns an error or panics.
 */
pub struct TransactionRunner<'db, D> {
    db: &'db D,
    configuration: RunnerConfiguration,
}

impl<'db, D: Database> TransactionRunner<'db, D> {
    /// Create a runner with the default [RunnerConfiguration].
    pub fn new(db: &'db D) -> Self {
        Self::with_configuration(db, RunnerConfiguration::new())
    }

    /// Create a runner using `configuration`.
    pub fn with_configuration(db: &'db D, configuration: RunnerConfiguration) -> Self {
        TransactionRunner { db, configuration }
    }

    /// The configuration this runner was created with.
    pub fn configuration(&self) -> &RunnerConfiguration {
        &self.configuration
    }

    /**
    Execute `work` inside a new transaction.

    1. A transaction is started. If this fails, its error is returned and `work` is not called.
    2. `work` is called with the transaction.
    3. If `work` succeeded, the transaction is committed.
    4. A rollback is attempted in any case, also if `work` panicked.
       A rollback of an already finished transaction (e.g. after the commit) is ignored.

    A failed rollback is attached to the error of `work` or the commit
    (see [TransactionError::RollbackAfterWork] and [TransactionError::RollbackAfterCommit]).
    If nothing else failed it is returned on its own as [TransactionError::Rollback],
    even though the commit went through.
    A panic is resumed after the rollback attempt.

    **Parameter**:
    - `work`: The unit of work. It receives the transaction to execute its statements in.
     */
    pub async fn run<F, T, E>(&self, work: F) -> Result<T, TransactionError<E, D::Error>>
    where
        F: for<'t> FnOnce(&'t mut D::Transaction) -> BoxFuture<'t, Result<T, E>>,
    {
        let mut tx = self
            .db
            .begin_transaction()
            .await
            .map_err(TransactionError::Begin)?;
        let started = Instant::now();
        self.lifecycle(format_args!("Transaction started"));

        let outcome = AssertUnwindSafe(work_then_commit(&mut tx, work))
            .catch_unwind()
            .await;

        let rollback = tx.rollback().await;
        self.log_slow(started.elapsed());

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(panic) => {
                match rollback {
                    Ok(()) => self.lifecycle(format_args!("Transaction rolled back after panic")),
                    Err(RollbackError::AlreadyFinished) => {}
                    Err(RollbackError::Failed(_)) => {
                        if let Some(level) = self.configuration.level(LevelFilter::Error) {
                            log!(level, "Rollback of transaction failed after panic");
                        }
                    }
                }
                resume_unwind(panic);
            }
        };

        let rollback = match rollback {
            Ok(()) if outcome.is_ok() => {
                // The driver did not consider the committed transaction finished
                self.lifecycle(format_args!("Transaction rolled back after commit"));
                None
            }
            Ok(()) => {
                self.lifecycle(format_args!("Transaction rolled back"));
                None
            }
            Err(RollbackError::AlreadyFinished) => {
                if outcome.is_ok() {
                    self.lifecycle(format_args!("Transaction committed"));
                }
                None
            }
            Err(RollbackError::Failed(err)) => Some(err),
        };

        match (outcome, rollback) {
            (Ok(value), None) => Ok(value),
            (Ok(_), Some(rollback)) => Err(TransactionError::Rollback(rollback)),
            (Err(Failure::Work(err)), None) => Err(TransactionError::Work(err)),
            (Err(Failure::Commit(err)), None) => Err(TransactionError::Commit(err)),
            (Err(Failure::Work(source)), Some(rollback)) => {
                Err(TransactionError::RollbackAfterWork { rollback, source })
            }
            (Err(Failure::Commit(source)), Some(rollback)) => {
                Err(TransactionError::RollbackAfterCommit { rollback, source })
            }
        }
    }

    fn lifecycle(&self, message: Arguments<'_>) {
        if let Some(level) = self.configuration.lifecycle_level() {
            log!(level, "{message}");
        }
    }

    fn log_slow(&self, elapsed: Duration) {
        if elapsed <= self.configuration.slow_threshold() {
            return;
        }
        if let Some(level) = self.configuration.slow_level() {
            log!(level, "Slow transaction: took {} ms", elapsed.as_millis());
        }
    }
}

/**
Call `work` and commit if it succeeded.

Commit is never attempted after `work` failed.
*/
async fn work_then_commit<X, F, T, E>(tx: &mut X, work: F) -> Result<T, Failure<E, X::Error>>
where
    X: Transaction,
    F: for<'t> FnOnce(&'t mut X) -> BoxFuture<'t, Result<T, E>>,
{
    let value = work(&mut *tx).await.map_err(Failure::Work)?;
    tx.commit().await.map_err(Failure::Commit)?;
    Ok(value)
}

/**
Execute `work` inside a new transaction of `db`, using the default configuration.

This is a shorthand for `TransactionRunner::new(db).run(work)`, see [TransactionRunner::run].
 */
pub async fn with_transaction<D, F, T, E>(
    db: &D,
    work: F,
) -> Result<T, TransactionError<E, D::Error>>
where
    D: Database,
    F: for<'t> FnOnce(&'t mut D::Transaction) -> BoxFuture<'t, Result<T, E>>,
{
    TransactionRunner::new(db).run(work).await
}
