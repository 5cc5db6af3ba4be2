//! `DuckDB` connection pool management.
//!
//! The database file is opened exactly once per pool. Every pooled connection
//! is a clone of that root handle, so all of them share one database instance
//! and see each other's committed writes.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ::duckdb::Connection;

use crate::WarehouseError;

struct PoolInner {
    db_path: PathBuf,
    max_pool_size: usize,
    root: Mutex<Option<Connection>>,
    idle: Mutex<Vec<Connection>>,
}

impl PoolInner {
    fn idle(&self) -> MutexGuard<'_, Vec<Connection>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A connection pool manager for `DuckDB` connections.
#[derive(Clone)]
pub struct DuckDbConnectionManager {
    inner: Arc<PoolInner>,
}

impl DuckDbConnectionManager {
    /// Open the database file and create a pool around it.
    ///
    /// # Arguments
    /// * `path` - Path to the `DuckDB` database file
    /// * `max_pool_size` - Maximum number of idle connections to keep
    ///
    /// # Errors
    /// Returns an error if the database file cannot be opened or configured.
    pub fn open(path: impl Into<PathBuf>, max_pool_size: usize) -> Result<Self, ::duckdb::Error> {
        let db_path = path.into();
        let root = Connection::open(db_path.as_path())?;
        configure_connection(&root)?;

        Ok(Self {
            inner: Arc::new(PoolInner {
                db_path,
                max_pool_size: max_pool_size.max(1),
                root: Mutex::new(Some(root)),
                idle: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Acquire a connection from the pool.
    ///
    /// The connection goes back to the pool when the returned guard is dropped,
    /// on every exit path of the caller.
    ///
    /// # Errors
    /// Returns an error if the pool was closed or a new connection cannot be
    /// cloned from the root handle.
    pub fn acquire(&self) -> Result<PooledConnection, WarehouseError> {
        let connection = self.inner.idle().pop();

        let connection = match connection {
            Some(connection) => connection,
            None => self.clone_root()?,
        };

        Ok(PooledConnection {
            pool: Arc::clone(&self.inner),
            connection: Some(connection),
        })
    }

    /// Close idle connections and the root handle.
    ///
    /// Connections still checked out are closed when their guards drop.
    pub fn close(&self) {
        let idle = std::mem::take(&mut *self.inner.idle());
        for connection in idle {
            if let Err((_, error)) = connection.close() {
                tracing::warn!(%error, "failed to close pooled duckdb connection");
            }
        }

        let root = self
            .inner
            .root
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(root) = root {
            if let Err((_, error)) = root.close() {
                tracing::warn!(%error, "failed to close duckdb database");
            }
        }
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.inner.db_path.as_path()
    }

    fn clone_root(&self) -> Result<Connection, WarehouseError> {
        let root = self
            .inner
            .root
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(root) = root.as_ref() else {
            return Err(WarehouseError::Closed);
        };
        let connection = root.try_clone()?;
        configure_connection(&connection)?;
        Ok(connection)
    }
}

/// A pooled connection that returns to the pool when dropped.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    connection: Option<Connection>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.connection
            .as_ref()
            .expect("pooled connection unexpectedly missing")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection
            .as_mut()
            .expect("pooled connection unexpectedly missing")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        let pool_open = self
            .pool
            .root
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        if !pool_open {
            return;
        }

        let mut idle = self.pool.idle();
        if idle.len() < self.pool.max_pool_size {
            idle.push(connection);
        }
    }
}

/// Configure a database connection with appropriate settings.
fn configure_connection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn released_connections_are_reused() {
        let temp = tempdir().expect("tempdir");
        let manager =
            DuckDbConnectionManager::open(temp.path().join("pool.duckdb"), 1).expect("open pool");

        {
            let connection = manager.acquire().expect("acquire");
            connection
                .execute_batch("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (1);")
                .expect("write");
        }
        assert_eq!(manager.inner.idle().len(), 1);

        let connection = manager.acquire().expect("acquire again");
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 1);
        assert!(manager.inner.idle().is_empty());
    }

    #[test]
    fn acquire_after_close_fails() {
        let temp = tempdir().expect("tempdir");
        let manager =
            DuckDbConnectionManager::open(temp.path().join("pool.duckdb"), 2).expect("open pool");
        manager.close();

        assert!(matches!(manager.acquire(), Err(WarehouseError::Closed)));
    }
}
