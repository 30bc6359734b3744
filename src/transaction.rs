use crate::error::RollbackError;

/**
Transactions can be used to provide a safe way to execute multiple SQL operations
after another with a way to go back to the start without something changed in the
database.

Can be obtained using [crate::Database::begin_transaction].

A transaction is resolved exactly once: after a successful [Transaction::commit] or
[Transaction::rollback] it is finished and every further rollback has to report
[RollbackError::AlreadyFinished].
*/
#[allow(async_fn_in_trait)]
pub trait Transaction {
    /// Error of the underlying driver.
    type Error;

    /**
    This function commits the transaction.
    */
    async fn commit(&mut self) -> Result<(), Self::Error>;

    /**
    Use this function to abort the transaction.

    Calling it on a finished transaction is not a failure,
    it returns [RollbackError::AlreadyFinished] instead.
    */
    async fn rollback(&mut self) -> Result<(), RollbackError<Self::Error>>;
}
