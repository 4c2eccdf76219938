//! Cross-process advisory lock around cache flushes.

use crate::Error;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;

/// Default wait for a contended lock before the flush is given up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Exclusive advisory lock on the store's `<path>.lock` file.
///
/// Acquired with non-blocking attempts so a holder in another process can
/// only delay a flush by `timeout`. Released on drop.
#[derive(Debug)]
pub struct FlushLock {
    file: File,
}

impl FlushLock {
    pub async fn acquire(path: &Path, timeout: Duration) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| Error::LockFailed(format!("{}: {e}", path.display())))?;

        let deadline = Instant::now() + timeout;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(Self { file }),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(Error::LockFailed(format!(
                            "{}: still held after {}ms",
                            path.display(),
                            timeout.as_millis()
                        )));
                    }
                    tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
                }
                Err(e) => return Err(Error::LockFailed(format!("{}: {e}", path.display()))),
            }
        }
    }
}

impl Drop for FlushLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "failed to release cache flush lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lock_is_exclusive_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.sqlite.lock");

        let guard = FlushLock::acquire(&path, DEFAULT_LOCK_TIMEOUT).await.unwrap();

        let other = File::open(&path).unwrap();
        assert!(FileExt::try_lock_exclusive(&other).is_err());

        drop(guard);
        assert!(FileExt::try_lock_exclusive(&other).is_ok());
        FileExt::unlock(&other).unwrap();
    }

    #[tokio::test]
    async fn test_contended_lock_gives_up_after_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.sqlite.lock");
        let holder = File::create(&path).unwrap();
        FileExt::lock_exclusive(&holder).unwrap();

        let start = std::time::Instant::now();
        let result = FlushLock::acquire(&path, Duration::from_millis(200)).await;

        assert!(matches!(result, Err(Error::LockFailed(_))));
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_lock_acquired_once_released() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.sqlite.lock");
        let holder = File::create(&path).unwrap();
        FileExt::lock_exclusive(&holder).unwrap();

        let waiter = {
            let path = path.clone();
            tokio::spawn(async move { FlushLock::acquire(&path, Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        FileExt::unlock(&holder).unwrap();

        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_lock_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("search.sqlite.lock");

        let result = FlushLock::acquire(&path, DEFAULT_LOCK_TIMEOUT).await;
        assert!(matches!(result, Err(Error::LockFailed(_))));
    }
}
