//! SQLite connection pool

use crate::{Result, StoreError};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Initialize the SQLite connection pool
///
/// The session is single-threaded, so the pool stays small; it exists so
/// that a failing connection is replaced instead of poisoning the store.
pub fn init_pool(path: &Path) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        Ok(())
    });

    Pool::builder()
        .max_size(2)
        .min_idle(Some(1))
        .build(manager)
        .map_err(|e| StoreError::Pool(e.to_string()))
}
