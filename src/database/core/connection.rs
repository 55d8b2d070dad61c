//! Database connection management
//!
//! [`ConnectionManager`] hands out scoped SQLite connections. Each call opens a
//! fresh connection, runs the caller's closure, and closes the connection again,
//! so no handle ever outlives a single call.
//!
//! SQLite allows many readers but only one writer per file. All writes are
//! serialized through a process-wide lock taken before the connection is
//! opened; reads share the same lock unless `share_read_lock` is turned off.
//! The lock belongs to the database file, not to the manager: every manager in
//! the process that points at the same file waits on the same lock.

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, TransactionBehavior};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, error, warn};

use super::error::StorageError;

/// Default time to wait for the store lock and for SQLite's own busy handler.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Scoped-acquisition connection manager for a single SQLite file.
pub struct ConnectionManager {
    path: PathBuf,
    timeout: Duration,
    share_read_lock: bool,
    lock: Arc<Mutex<()>>,
}

/// Writer locks of every database file opened in this process, by file
static FILE_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

fn file_lock(path: &Path) -> Arc<Mutex<()>> {
    let locks = FILE_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    Arc::clone(locks.lock().entry(lock_key(path)).or_default())
}

/// Normalize `path` so different spellings of the same file share a lock.
///
/// The file itself may not exist yet, so only its directory is canonicalized.
fn lock_key(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

impl ConnectionManager {
    /// Create a manager for the database file at `path`.
    ///
    /// Nothing is opened until the first call to [`with_connection`](Self::with_connection)
    /// or [`with_read_connection`](Self::with_read_connection).
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        let path = path.into();
        Self {
            lock: file_lock(&path),
            path,
            timeout,
            share_read_lock: true,
        }
    }

    /// Whether reads take the same lock as writes (default: true).
    pub fn with_shared_read_lock(mut self, share: bool) -> Self {
        self.share_read_lock = share;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` inside a write transaction.
    ///
    /// The transaction is committed when `f` returns `Ok` and rolled back when it
    /// returns `Err`. The connection is closed before this returns, whatever the
    /// outcome. If `f` panics, the transaction and connection guards roll back and
    /// close on unwind, and the lock is released.
    pub fn with_connection<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let _guard = self.acquire()?;
        let mut conn = self.open()?;

        let result = {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| {
                    let err = StorageError::from_sqlite("failed to begin transaction", e);
                    error!("{}", err);
                    err
                })?;

            match f(&*tx) {
                Ok(value) => tx
                    .commit()
                    .map(|_| value)
                    .map_err(|e| StorageError::from_sqlite("failed to commit transaction", e)),
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback() {
                        warn!("Failed to roll back transaction: {}", rollback_err);
                    }
                    Err(err)
                }
            }
        };

        if let Err(err) = &result {
            error!("Database error on {}: {}", self.path.display(), err);
        }

        self.close(conn);
        result
    }

    /// Run `f` with a connection intended for reads only.
    ///
    /// No transaction is opened; a single statement already sees a consistent
    /// snapshot of the store.
    pub fn with_read_connection<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let _guard = if self.share_read_lock {
            Some(self.acquire()?)
        } else {
            None
        };
        let conn = self.open()?;

        let result = f(&conn);
        if let Err(err) = &result {
            error!("Database error on {}: {}", self.path.display(), err);
        }

        self.close(conn);
        result
    }

    /// Run `f` on a read-only connection to an existing file.
    ///
    /// Nothing is created and no pragma is changed, so the file is left exactly
    /// as it was. A missing file is a `ConnectionFailed` error.
    pub fn with_read_only_connection<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.path, flags).map_err(|e| {
            StorageError::from_sqlite(
                &format!("failed to open database at '{}' read-only", self.path.display()),
                e,
            )
        })?;
        conn.busy_timeout(self.timeout)
            .map_err(|e| StorageError::from_sqlite("failed to set busy timeout", e))?;

        let result = f(&conn);
        self.close(conn);
        result
    }

    fn acquire(&self) -> Result<parking_lot::MutexGuard<'_, ()>, StorageError> {
        self.lock.try_lock_for(self.timeout).ok_or_else(|| {
            let err = StorageError::Busy(format!(
                "timed out after {:?} waiting for the store lock on {}",
                self.timeout,
                self.path.display()
            ));
            warn!("{}", err);
            err
        })
    }

    /// Open and configure a fresh connection.
    fn open(&self) -> Result<Connection, StorageError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&self.path, flags).map_err(|e| {
            let err = StorageError::from_sqlite(
                &format!("failed to open database at '{}'", self.path.display()),
                e,
            );
            error!("{}", err);
            err
        })?;

        configure(&conn, self.timeout).map_err(|err| {
            error!("{}", err);
            err
        })?;
        debug!("Opened connection to {}", self.path.display());
        Ok(conn)
    }

    fn close(&self, conn: Connection) {
        if let Err((_conn, e)) = conn.close() {
            // The returned connection is dropped here, which closes it regardless.
            warn!("Failed to close connection to {}: {}", self.path.display(), e);
        }
    }
}

/// Configure a connection with the store's settings.
fn configure(conn: &Connection, timeout: Duration) -> Result<(), StorageError> {
    conn.busy_timeout(timeout)
        .map_err(|e| StorageError::from_sqlite("failed to set busy timeout", e))?;

    // Write-ahead logging lets readers proceed while a write is in flight
    let _: String = conn
        .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
        .map_err(|e| StorageError::from_sqlite("failed to set journal mode", e))?;

    conn.execute_batch(
        "PRAGMA synchronous=NORMAL;
         PRAGMA foreign_keys=ON;",
    )
    .map_err(|e| StorageError::from_sqlite("failed to configure connection", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::error::StorageErrorKind;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    fn create_table(manager: &ConnectionManager) {
        manager
            .with_connection(|conn| {
                conn.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)", [])?;
                Ok(())
            })
            .unwrap();
    }

    fn row_count(manager: &ConnectionManager) -> i64 {
        manager
            .with_read_connection(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))?)
            })
            .unwrap()
    }

    #[test]
    fn test_commit_on_success() {
        let dir = tempdir().unwrap();
        let manager = ConnectionManager::new(dir.path().join("test.db"), DEFAULT_BUSY_TIMEOUT);
        create_table(&manager);

        manager
            .with_connection(|conn| {
                conn.execute("INSERT INTO t (v) VALUES ('a')", [])?;
                Ok(())
            })
            .unwrap();

        assert_eq!(row_count(&manager), 1);
    }

    #[test]
    fn test_rollback_on_error() {
        let dir = tempdir().unwrap();
        let manager = ConnectionManager::new(dir.path().join("test.db"), DEFAULT_BUSY_TIMEOUT);
        create_table(&manager);

        let result: Result<(), StorageError> = manager.with_connection(|conn| {
            conn.execute("INSERT INTO t (v) VALUES ('a')", [])?;
            Err(StorageError::Unknown("forced failure".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(row_count(&manager), 0);
    }

    #[test]
    fn test_rollback_on_panic() {
        let dir = tempdir().unwrap();
        let manager = Arc::new(ConnectionManager::new(
            dir.path().join("test.db"),
            DEFAULT_BUSY_TIMEOUT,
        ));
        create_table(&manager);

        let m = Arc::clone(&manager);
        let handle = thread::spawn(move || {
            let _: Result<(), StorageError> = m.with_connection(|conn| {
                conn.execute("INSERT INTO t (v) VALUES ('a')", [])?;
                panic!("unexpected failure inside scope");
            });
        });
        assert!(handle.join().is_err());

        // Lock was released and nothing was committed
        assert_eq!(row_count(&manager), 0);
    }

    #[test]
    fn test_wal_mode_enabled() {
        let dir = tempdir().unwrap();
        let manager = ConnectionManager::new(dir.path().join("test.db"), DEFAULT_BUSY_TIMEOUT);

        let mode: String = manager
            .with_read_connection(|conn| {
                Ok(conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_unreachable_store_is_connection_failed() {
        let dir = tempdir().unwrap();
        let manager = ConnectionManager::new(
            dir.path().join("missing").join("test.db"),
            DEFAULT_BUSY_TIMEOUT,
        );

        let err = manager.with_read_connection(|_| Ok(())).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::ConnectionFailed);
    }

    #[test]
    fn test_lock_timeout_is_busy() {
        let dir = tempdir().unwrap();
        let manager = Arc::new(ConnectionManager::new(
            dir.path().join("test.db"),
            Duration::from_millis(50),
        ));
        create_table(&manager);

        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let m = Arc::clone(&manager);
        let holder = thread::spawn(move || {
            m.with_connection(|_| {
                entered_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(500));
                Ok(())
            })
        });

        entered_rx.recv().unwrap();
        let err = manager.with_connection(|_| Ok(())).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::Busy);
        assert!(err.is_retryable());

        holder.join().unwrap().unwrap();
    }

    #[test]
    fn test_unshared_reads_skip_lock() {
        let dir = tempdir().unwrap();
        let manager = Arc::new(
            ConnectionManager::new(dir.path().join("test.db"), Duration::from_millis(50))
                .with_shared_read_lock(false),
        );
        create_table(&manager);

        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let m = Arc::clone(&manager);
        let holder = thread::spawn(move || {
            m.with_connection(|conn| {
                conn.execute("INSERT INTO t (v) VALUES ('a')", [])?;
                entered_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(300));
                Ok(())
            })
        });

        entered_rx.recv().unwrap();
        // WAL lets the reader see the last committed state while the write is open
        assert_eq!(row_count(&manager), 0);

        holder.join().unwrap().unwrap();
        assert_eq!(row_count(&manager), 1);
    }

    #[test]
    fn test_managers_on_same_file_share_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let first = Arc::new(ConnectionManager::new(&path, Duration::from_millis(50)));
        // Same file, spelled differently
        let second = ConnectionManager::new(
            dir.path().join(".").join("test.db"),
            Duration::from_millis(50),
        );
        create_table(&first);

        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let m = Arc::clone(&first);
        let holder = thread::spawn(move || {
            m.with_connection(|_| {
                entered_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(500));
                Ok(())
            })
        });

        entered_rx.recv().unwrap();
        let err = second.with_connection(|_| Ok(())).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::Busy);

        holder.join().unwrap().unwrap();
    }

    #[test]
    fn test_managers_on_different_files_do_not_share_lock() {
        let dir = tempdir().unwrap();
        let first = ConnectionManager::new(dir.path().join("a.db"), DEFAULT_BUSY_TIMEOUT);
        let second = ConnectionManager::new(dir.path().join("b.db"), DEFAULT_BUSY_TIMEOUT);
        assert!(!Arc::ptr_eq(&first.lock, &second.lock));
    }

    #[test]
    fn test_read_only_connection_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.db");
        {
            let conn = Connection::open(&path).unwrap();
            // A fresh file starts in rollback-journal mode
            conn.execute("CREATE TABLE t (id INTEGER)", []).unwrap();
        }

        let manager = ConnectionManager::new(&path, DEFAULT_BUSY_TIMEOUT);
        let mode: String = manager
            .with_read_only_connection(|conn| {
                Ok(conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(mode.to_lowercase(), "delete");

        let missing = ConnectionManager::new(dir.path().join("absent.db"), DEFAULT_BUSY_TIMEOUT);
        let err = missing.with_read_only_connection(|_| Ok(())).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::ConnectionFailed);
        assert!(!dir.path().join("absent.db").exists());
    }
}
