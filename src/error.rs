/**
Error type of the bundled sqlx driver.
 */
#[cfg(feature = "sqlx-dep")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error returned from Sqlx
    #[error("sqlx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// The transaction was already committed or rolled back.
    #[error("transaction has already been committed or rolled back")]
    TransactionFinished,
}

/**
Failure of [crate::Transaction::rollback].
 */
#[derive(Debug, thiserror::Error)]
pub enum RollbackError<E> {
    /// The transaction was already committed or rolled back.
    ///
    /// This is the expected outcome of the cleanup after a commit and is never reported.
    #[error("transaction has already been committed or rolled back")]
    AlreadyFinished,

    /// The rollback itself failed.
    #[error(transparent)]
    Failed(E),
}

/**
Error returned by [crate::TransactionRunner::run].

`E` is the error of the unit of work, `D` the error of the database driver.

The display of every variant is the display of the original error.
[std::error::Error::source] returns the original error, also when a failed rollback
is attached to it. In this case the display shows both messages.
 */
#[derive(Debug, thiserror::Error)]
pub enum TransactionError<E, D> {
    /// The transaction could not be started.
    #[error("{0}")]
    Begin(#[source] D),

    /// The unit of work failed, the transaction was rolled back.
    #[error("{0}")]
    Work(#[source] E),

    /// The commit failed.
    #[error("{0}")]
    Commit(#[source] D),

    /// The rollback failed although nothing else did.
    #[error("{0}")]
    Rollback(#[source] D),

    /// The unit of work failed and the following rollback failed as well.
    #[error("{rollback}: {source}")]
    RollbackAfterWork {
        /// Error of the rollback
        rollback: D,
        /// Error of the unit of work
        source: E,
    },

    /// The commit failed and the following rollback failed as well.
    #[error("{rollback}: {source}")]
    RollbackAfterCommit {
        /// Error of the rollback
        rollback: D,
        /// Error of the commit
        source: D,
    },
}

impl<E, D> TransactionError<E, D> {
    /// The error returned by the unit of work, if it failed.
    pub fn work_error(&self) -> Option<&E> {
        match self {
            TransactionError::Work(err) => Some(err),
            TransactionError::RollbackAfterWork { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Take the error returned by the unit of work, if it failed.
    pub fn into_work_error(self) -> Option<E> {
        match self {
            TransactionError::Work(err) => Some(err),
            TransactionError::RollbackAfterWork { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The error of a failed rollback, whether it was composed or not.
    pub fn rollback_error(&self) -> Option<&D> {
        match self {
            TransactionError::Rollback(err) => Some(err),
            TransactionError::RollbackAfterWork { rollback, .. }
            | TransactionError::RollbackAfterCommit { rollback, .. } => Some(rollback),
            _ => None,
        }
    }
}
