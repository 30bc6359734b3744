//! Run a unit of work inside a database transaction.
//!
//! The transaction is committed if the work succeeds and rolled back if it fails
//! or panics. Drivers plug in through the [`Database`] and [`Transaction`] traits,
//! an adapter for [sqlx](https://docs.rs/sqlx) pools is available behind the
//! `sqlx-dep` feature (enabled by any of the driver features).
//!
//! ```ignore
//! use futures::FutureExt;
//!
//! let id = tx_runner::with_transaction(&pool, |tx| {
//!     async move {
//!         let conn = tx.connection()?;
//!         sqlx::query("INSERT INTO account (owner) VALUES ('alice')")
//!             .execute(&mut *conn)
//!             .await?;
//!         Ok::<_, tx_runner::Error>(())
//!     }
//!     .boxed()
//! })
//! .await?;
//! ```
#![warn(missing_docs)]

/**
The database handle capability.
*/
pub mod database;

/**
Errors of tx-runner will be specified here.
*/
pub mod error;

/**
Executes units of work and resolves their transactions.
*/
pub mod runner;

/**
The transaction handle capability.
*/
pub mod transaction;

#[cfg(feature = "sqlx-dep")]
/**
[`Database`] and [`Transaction`] implementations for sqlx.
*/
pub mod database_sqlx;

pub use crate::database::Database;
pub use crate::error::{RollbackError, TransactionError};
pub use crate::runner::{with_transaction, RunnerConfiguration, TransactionRunner};
pub use crate::transaction::Transaction;

#[cfg(feature = "sqlx-dep")]
pub use crate::database_sqlx::SqlxTransaction;
#[cfg(feature = "sqlx-dep")]
pub use crate::error::Error;
