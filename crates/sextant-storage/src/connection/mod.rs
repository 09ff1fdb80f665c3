//! DatabaseManager: one serialized writer plus a read-only pool.

pub mod pool;
pub mod pragmas;
pub mod writer;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use rusqlite::Connection;
use sextant_core::errors::StorageError;

use self::pool::ReadPool;
use crate::migrations;
use crate::session::Session;
use crate::to_storage_err;

/// Owns the writer connection and the read pool.
///
/// Every write goes through [`DatabaseManager::write`], which serializes
/// callers on the writer mutex and wraps the closure in `BEGIN IMMEDIATE`.
/// In-memory databases have no pool; their reads use the writer.
pub struct DatabaseManager {
    writer: Mutex<Connection>,
    readers: Option<ReadPool>,
    path: Option<PathBuf>,
}

impl DatabaseManager {
    /// Open a file-backed database, apply pragmas and run migrations.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Self::open_with_pool_size(path, ReadPool::default_size())
    }

    pub fn open_with_pool_size(path: &Path, pool_size: usize) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(to_storage_err)?;
        pragmas::apply_pragmas(&conn)?;
        if !pragmas::verify_wal_mode(&conn)? {
            tracing::warn!(path = %path.display(), "WAL journaling unavailable; continuing");
        }
        migrations::run_migrations(&conn)?;

        // The pool opens after migrations so readers see the schema.
        let readers = ReadPool::open(path, pool_size)?;
        tracing::debug!(path = %path.display(), readers = readers.size(), "database opened");

        Ok(Self {
            writer: Mutex::new(conn),
            readers: Some(readers),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (tests and throwaway runs).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(to_storage_err)?;
        pragmas::apply_pragmas(&conn)?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            writer: Mutex::new(conn),
            readers: None,
            path: None,
        })
    }

    /// Run `f` as one atomic unit of work on the writer connection.
    /// `Ok` commits; `Err` or a panic inside `f` rolls back.
    pub fn write<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Session<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        // A poisoned writer only means an earlier closure panicked; its
        // transaction was rolled back when the guard dropped.
        let conn = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer::with_immediate_transaction(&conn, |tx| f(&Session::new(tx)))
    }

    /// Run a read-only closure. Uses the pool when file-backed.
    pub fn read<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Session<'_>) -> Result<T, E>,
    {
        match &self.readers {
            Some(pool) => pool.with_conn(|conn| f(&Session::new(conn))),
            None => {
                let conn = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
                f(&Session::new(&conn))
            }
        }
    }

    /// Truncating WAL checkpoint. No-op for in-memory databases.
    pub fn checkpoint(&self) -> Result<(), StorageError> {
        if self.path.is_none() {
            return Ok(());
        }
        let conn = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            .map_err(to_storage_err)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
