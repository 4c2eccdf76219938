//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! for durability and concurrency (WAL mode), preparing the sibling lock file,
//! and running migrations.

use super::lock::DEFAULT_LOCK_TIMEOUT;
use super::migrations;
use super::search::PendingWrites;
use crate::Error;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_rusqlite::Connection;

/// Cache database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread, plus the writes buffered until the next flush.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
    pub(crate) lock_path: Option<PathBuf>,
    pub(crate) lock_timeout: Duration,
    pub(crate) pending: PendingWrites,
}

impl CacheDb {
    /// Open a database at the specified path.
    ///
    /// Creates the parent directory and the `<path>.lock` file if they don't
    /// exist, applies pragmas, and runs any pending migrations. Any failure to
    /// reach the file is reported as [`Error::StoreUnavailable`].
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::StoreUnavailable(format!("{}: {e}", parent.display())))?;
        }

        let lock_path = lock_path_for(path);
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| Error::StoreUnavailable(format!("{}: {e}", lock_path.display())))?;

        let conn = Connection::open(path)
            .await
            .map_err(|e| Error::StoreUnavailable(format!("{}: {e}", path.display())))?;

        configure(&conn).await?;
        migrations::run(&conn).await?;

        tracing::debug!(path = %path.display(), "opened search cache");

        Ok(Self {
            conn,
            lock_path: Some(lock_path),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            pending: PendingWrites::default(),
        })
    }

    /// Open an in-memory database for testing.
    ///
    /// Same schema and pragmas as file-based databases; flushes skip the
    /// advisory lock since nothing else can see the data.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;

        configure(&conn).await?;
        migrations::run(&conn).await?;

        Ok(Self { conn, lock_path: None, lock_timeout: DEFAULT_LOCK_TIMEOUT, pending: PendingWrites::default() })
    }

    /// Bound how long a flush waits on another holder of the lock file.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Path of the advisory lock file, if this store is file-backed.
    pub fn lock_path(&self) -> Option<&Path> {
        self.lock_path.as_deref()
    }
}

/// Sibling lock file guarding flushes: `<path>.lock`.
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(".lock");
    PathBuf::from(raw)
}

async fn configure(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=FULL;
             PRAGMA busy_timeout=5000;
             PRAGMA temp_store=MEMORY;",
        )?;
        Ok(())
    })
    .await
    .map_err(Error::Database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let version = db
            .conn
            .call(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0)))
            .await
            .unwrap();
        assert!(!version.is_empty());
        assert!(db.lock_path().is_none());
    }

    #[tokio::test]
    async fn test_open_creates_directory_and_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache").join("search.sqlite");

        let db = CacheDb::open(&path).await.unwrap();

        assert!(path.parent().unwrap().is_dir());
        let lock = db.lock_path().unwrap();
        assert_eq!(lock, lock_path_for(&path).as_path());
        assert!(lock.exists());
    }

    #[tokio::test]
    async fn test_open_unreachable_path_is_unavailable() {
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let path = blocker.path().join("search.sqlite");

        let result = CacheDb::open(&path).await;
        assert!(matches!(result, Err(Error::StoreUnavailable(_))));
    }

    #[test]
    fn test_lock_path_for() {
        assert_eq!(lock_path_for(Path::new("cache/search.db")), PathBuf::from("cache/search.db.lock"));
    }
}
