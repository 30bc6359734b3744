use log::debug;

use crate::database::Database;
use crate::error::{Error, RollbackError};
use crate::transaction::Transaction;

/**
A transaction of a [sqlx::Pool].

The inner sqlx transaction is taken out on commit and rollback,
so every following resolution finds the transaction finished.
If it is dropped while still open, sqlx rolls it back.
*/
pub struct SqlxTransaction<DB: sqlx::Database> {
    tx: Option<sqlx::Transaction<'static, DB>>,
}

impl<DB: sqlx::Database> SqlxTransaction<DB> {
    /**
    Access the connection of this transaction to execute statements on.

    Returns [Error::TransactionFinished] if the transaction was already committed or rolled back.
    */
    pub fn connection(&mut self) -> Result<&mut DB::Connection, Error> {
        self.tx.as_deref_mut().ok_or(Error::TransactionFinished)
    }

    /// Whether the transaction was already committed or rolled back.
    pub fn is_finished(&self) -> bool {
        self.tx.is_none()
    }
}

impl<DB: sqlx::Database> From<sqlx::Transaction<'static, DB>> for SqlxTransaction<DB> {
    fn from(tx: sqlx::Transaction<'static, DB>) -> Self {
        SqlxTransaction { tx: Some(tx) }
    }
}

impl<DB: sqlx::Database> Database for sqlx::Pool<DB> {
    type Error = Error;
    type Transaction = SqlxTransaction<DB>;

    async fn begin_transaction(&self) -> Result<SqlxTransaction<DB>, Error> {
        let tx = self.begin().await?;
        debug!("SQL: BEGIN");
        Ok(tx.into())
    }
}

impl<DB: sqlx::Database> Transaction for SqlxTransaction<DB> {
    type Error = Error;

    async fn commit(&mut self) -> Result<(), Error> {
        let tx = self.tx.take().ok_or(Error::TransactionFinished)?;
        debug!("SQL: COMMIT");
        tx.commit().await.map_err(Error::SqlxError)
    }

    async fn rollback(&mut self) -> Result<(), RollbackError<Error>> {
        let tx = self.tx.take().ok_or(RollbackError::AlreadyFinished)?;
        debug!("SQL: ROLLBACK");
        tx.rollback()
            .await
            .map_err(|err| RollbackError::Failed(Error::SqlxError(err)))
    }
}
