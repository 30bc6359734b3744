use crate::transaction::Transaction;

/**
A handle that is able to start transactions.

The handle is long-lived and only borrowed by the runner,
e.g. a connection pool.
*/
#[allow(async_fn_in_trait)]
pub trait Database {
    /// Error returned by the driver when starting or resolving a transaction.
    type Error;

    /// The transaction started by [Database::begin_transaction].
    type Transaction: Transaction<Error = Self::Error>;

    /**
    Start a new transaction.

    An error (e.g. no connection available) is handed to the caller of the runner unchanged.
    */
    async fn begin_transaction(&self) -> Result<Self::Transaction, Self::Error>;
}
