//! Write units of work: BEGIN IMMEDIATE, commit on `Ok`, rollback otherwise.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use sextant_core::errors::StorageError;

use crate::to_storage_err;

/// Run `f` inside a `BEGIN IMMEDIATE` transaction. The write lock is taken at
/// transaction start, so `SQLITE_BUSY` cannot surface mid-transaction.
/// An `Err` from `f`, or a panic, rolls the transaction back on drop.
pub fn with_immediate_transaction<F, T, E>(conn: &Connection, f: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<StorageError>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(to_storage_err)?;
    let result = f(&tx)?;
    tx.commit().map_err(to_storage_err)?;
    Ok(result)
}
