//! Search cache operations.
//!
//! `put` only buffers; `flush` commits every buffered entry in one
//! transaction while holding the advisory lock, so each key is written
//! all-or-nothing and writers from independent processes serialize.
//! Reads never take the lock.

use super::connection::CacheDb;
use super::key::CacheKey;
use super::lock::FlushLock;
use crate::Error;
use crate::record::ResultRecord;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_rusqlite::params;

/// Writes accepted by `put` but not yet flushed, keyed by key hash.
pub(crate) type PendingWrites = Arc<Mutex<HashMap<String, PendingEntry>>>;

#[derive(Debug, Clone)]
pub(crate) struct PendingEntry {
    key: CacheKey,
    results_json: String,
}

impl CacheDb {
    /// Look up the records stored for `key`.
    ///
    /// Buffered writes are visible before they are flushed. Returns None if
    /// the key has never been stored.
    pub async fn get(&self, key: &CacheKey) -> Result<Option<Vec<ResultRecord>>, Error> {
        let key_hash = key.hash();

        if let Some(entry) = self.pending.lock().await.get(&key_hash) {
            return Ok(Some(serde_json::from_str(&entry.results_json)?));
        }

        let json = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT results_json FROM search_cache WHERE key_hash = ?1")?;

                let result = stmt.query_row(params![key_hash], |row| row.get(0));

                match result {
                    Ok(json) => Ok(Some(json)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        json.map(|json| serde_json::from_str(&json)).transpose().map_err(Error::from)
    }

    /// Buffer `records` under `key`, replacing any earlier buffered value.
    ///
    /// Nothing reaches disk until [`CacheDb::flush`].
    pub async fn put(&self, key: &CacheKey, records: &[ResultRecord]) -> Result<(), Error> {
        let results_json = serde_json::to_string(records)?;
        self.pending
            .lock()
            .await
            .insert(key.hash(), PendingEntry { key: key.clone(), results_json });
        Ok(())
    }

    /// Commit all buffered writes.
    ///
    /// Waits up to the store's lock timeout for the `<path>.lock` advisory
    /// lock, then writes the batch in one transaction. Entries leave the
    /// buffer only once committed, and only if no newer value was buffered
    /// meanwhile; on failure everything stays buffered for a later flush.
    ///
    /// Returns the number of entries written.
    pub async fn flush(&self) -> Result<usize, Error> {
        let batch: Vec<(String, PendingEntry)> = self
            .pending
            .lock()
            .await
            .iter()
            .map(|(hash, entry)| (hash.clone(), entry.clone()))
            .collect();
        if batch.is_empty() {
            return Ok(0);
        }

        let _guard = match &self.lock_path {
            Some(path) => Some(FlushLock::acquire(path, self.lock_timeout).await?),
            None => None,
        };

        let rows = batch.clone();
        let stored_at = Utc::now().to_rfc3339();

        let written = self
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO search_cache
                            (key_hash, query, include_descriptions, num_results, results_json, stored_at)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                        ON CONFLICT(key_hash) DO UPDATE SET
                            results_json = excluded.results_json,
                            stored_at = excluded.stored_at",
                    )?;
                    for (key_hash, entry) in &rows {
                        stmt.execute(params![
                            key_hash,
                            entry.key.query,
                            entry.key.include_descriptions,
                            entry.key.num_results,
                            entry.results_json,
                            stored_at,
                        ])?;
                    }
                }
                tx.commit()?;

                Ok(rows.len())
            })
            .await
            .map_err(Error::from)?;

        let mut pending = self.pending.lock().await;
        for (key_hash, flushed) in batch {
            if pending.get(&key_hash).is_some_and(|entry| entry.results_json == flushed.results_json) {
                pending.remove(&key_hash);
            }
        }

        Ok(written)
    }

    /// Flush outstanding writes and close the connection.
    ///
    /// The connection is closed even when the final flush fails; the first
    /// error is returned.
    pub async fn close(&self) -> Result<(), Error> {
        let flushed = self.flush().await;
        let closed = self.conn.clone().close().await.map_err(Error::from);
        flushed?;
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::connection::lock_path_for;
    use fs2::FileExt;
    use std::fs::File;
    use std::time::Duration;

    fn records(urls: &[&str]) -> Vec<ResultRecord> {
        urls.iter().map(|u| ResultRecord::url_only(*u)).collect()
    }

    async fn stored_rows(db: &CacheDb) -> i64 {
        db.conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM search_cache", [], |row| row.get(0)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_flush_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = CacheKey::new("rust", false, 5);

        db.put(&key, &records(&["a", "b"])).await.unwrap();
        assert_eq!(db.flush().await.unwrap(), 1);

        let retrieved = db.get(&key).await.unwrap().unwrap();
        assert_eq!(retrieved, records(&["a", "b"]));
        assert_eq!(stored_rows(&db).await, 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.get(&CacheKey::new("nothing", true, 5)).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_buffered_write_visible_before_flush() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = CacheKey::new("rust", true, 3);

        db.put(&key, &records(&["a"])).await.unwrap();

        assert_eq!(db.get(&key).await.unwrap(), Some(records(&["a"])));
        assert_eq!(stored_rows(&db).await, 0);
    }

    #[tokio::test]
    async fn test_flush_with_nothing_pending() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert_eq!(db.flush().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_overwrite_same_key() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = CacheKey::new("rust", false, 5);

        db.put(&key, &records(&["old"])).await.unwrap();
        db.flush().await.unwrap();
        db.put(&key, &records(&["new-1", "new-2"])).await.unwrap();
        db.flush().await.unwrap();

        assert_eq!(db.get(&key).await.unwrap(), Some(records(&["new-1", "new-2"])));
        assert_eq!(stored_rows(&db).await, 1);
    }

    #[tokio::test]
    async fn test_empty_result_set_is_an_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = CacheKey::new("nothing matches", false, 5);

        db.put(&key, &[]).await.unwrap();
        db.flush().await.unwrap();

        assert_eq!(db.get(&key).await.unwrap(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("search.sqlite");
        let key = CacheKey::new("persisted", true, 2);
        let stored = vec![ResultRecord::new("https://a.example", "A", "First")];

        let db = CacheDb::open(&path).await.unwrap();
        db.put(&key, &stored).await.unwrap();
        db.flush().await.unwrap();
        db.close().await.unwrap();

        let reopened = CacheDb::open(&path).await.unwrap();
        assert_eq!(reopened.get(&key).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn test_close_flushes_pending_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.sqlite");
        let key = CacheKey::new("late write", false, 1);

        let db = CacheDb::open(&path).await.unwrap();
        db.put(&key, &records(&["a"])).await.unwrap();
        db.close().await.unwrap();

        let reopened = CacheDb::open(&path).await.unwrap();
        assert_eq!(reopened.get(&key).await.unwrap(), Some(records(&["a"])));
    }

    #[tokio::test]
    async fn test_two_handles_share_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.sqlite");

        let first = CacheDb::open(&path).await.unwrap();
        let second = CacheDb::open(&path).await.unwrap();

        let key_a = CacheKey::new("a", false, 5);
        let key_b = CacheKey::new("b", false, 5);
        first.put(&key_a, &records(&["from-first"])).await.unwrap();
        second.put(&key_b, &records(&["from-second"])).await.unwrap();

        let (r1, r2) = tokio::join!(first.flush(), second.flush());
        r1.unwrap();
        r2.unwrap();

        assert_eq!(first.get(&key_b).await.unwrap(), Some(records(&["from-second"])));
        assert_eq!(second.get(&key_a).await.unwrap(), Some(records(&["from-first"])));
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_writes_buffered() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = CacheKey::new("rust", false, 5);

        db.put(&key, &records(&["a"])).await.unwrap();
        db.conn.clone().close().await.unwrap();

        assert!(db.flush().await.is_err());
        assert_eq!(db.pending.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_flush_drains_buffer() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put(&CacheKey::new("a", false, 5), &records(&["a"])).await.unwrap();
        db.put(&CacheKey::new("b", false, 5), &records(&["b"])).await.unwrap();

        assert_eq!(db.flush().await.unwrap(), 2);
        assert!(db.pending.lock().await.is_empty());
        assert_eq!(stored_rows(&db).await, 2);
    }

    #[tokio::test]
    async fn test_contended_lock_fails_flush_but_reads_proceed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.sqlite");
        let db = CacheDb::open(&path)
            .await
            .unwrap()
            .with_lock_timeout(Duration::from_millis(1_000));

        let stored = CacheKey::new("stored", false, 5);
        db.put(&stored, &records(&["a"])).await.unwrap();
        db.flush().await.unwrap();

        let holder = File::open(lock_path_for(&path)).unwrap();
        FileExt::lock_exclusive(&holder).unwrap();

        let blocked = CacheKey::new("blocked", false, 5);
        db.put(&blocked, &records(&["b"])).await.unwrap();

        let start = std::time::Instant::now();
        let flushing = {
            let db = db.clone();
            tokio::spawn(async move { db.flush().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let read = tokio::time::timeout(Duration::from_millis(500), db.get(&stored))
            .await
            .expect("read waited on the flush lock");
        assert_eq!(read.unwrap(), Some(records(&["a"])));
        assert!(!flushing.is_finished());

        let flushed = flushing.await.unwrap();
        assert!(matches!(flushed, Err(Error::LockFailed(_))));
        assert!(start.elapsed() < Duration::from_secs(3));

        assert_eq!(db.get(&blocked).await.unwrap(), Some(records(&["b"])));

        FileExt::unlock(&holder).unwrap();
        assert_eq!(db.flush().await.unwrap(), 1);
        assert_eq!(stored_rows(&db).await, 2);
    }
}
