//! The cache-and-retry search engine.
//!
//! One engine is shared by every request. For each search it consults the
//! cache (first attempt only), then drives up to `max_retries` provider
//! attempts: rate-limited failures back off exponentially, other failures
//! rotate the client identity and wait a flat delay. Provider and store
//! errors never escape; exhaustion yields an empty result set.

use crate::backoff::BackoffPolicy;
use crate::cache::{CacheDb, CacheKey};
use crate::config::AppConfig;
use crate::identity::IdentityRotator;
use crate::provider::{ProviderError, ProviderRequest, SafeSearch, SearchProvider};
use crate::record::{ResultRecord, normalize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Semaphore, watch};

/// Per-request options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub num_results: u8,
    pub use_cache: bool,
    pub include_descriptions: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { num_results: 5, use_cache: true, include_descriptions: true }
    }
}

/// Retry and concurrency knobs for [`SearchEngine`].
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub max_retries: u32,
    pub backoff: BackoffPolicy,
    /// Searches allowed to run at once; the rest queue.
    pub max_concurrent: usize,
    pub safe_search: SafeSearch,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { max_retries: 3, backoff: BackoffPolicy::default(), max_concurrent: 4, safe_search: SafeSearch::Off }
    }
}

/// Orchestrates cache lookups and provider retries.
pub struct SearchEngine {
    store: Option<CacheDb>,
    provider: Arc<dyn SearchProvider>,
    identity: IdentityRotator,
    settings: EngineSettings,
    permits: Semaphore,
    shutdown: watch::Sender<bool>,
    closed: AtomicBool,
}

impl SearchEngine {
    pub fn new(store: Option<CacheDb>, provider: Arc<dyn SearchProvider>, settings: EngineSettings) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            store,
            provider,
            identity: IdentityRotator::new(),
            permits: Semaphore::new(settings.max_concurrent.max(1)),
            settings,
            shutdown,
            closed: AtomicBool::new(false),
        }
    }

    /// Build an engine from configuration, opening the cache at `cache_path`.
    ///
    /// A cache that cannot be opened is logged and the engine runs without
    /// one: every lookup misses and nothing is persisted.
    pub async fn open(config: &AppConfig, provider: Arc<dyn SearchProvider>) -> Self {
        let store = match CacheDb::open(&config.cache_path).await {
            Ok(db) => {
                let db = db.with_lock_timeout(config.lock_timeout());
                tracing::info!(
                    path = %config.cache_path.display(),
                    lock = ?db.lock_path(),
                    lock_timeout_ms = config.lock_timeout_ms,
                    "search cache opened"
                );
                Some(db)
            }
            Err(e) => {
                tracing::error!(path = %config.cache_path.display(), error = %e, "search cache unavailable, caching disabled");
                None
            }
        };

        tracing::info!(
            request_delay_secs = config.request_delay_secs,
            max_retries = config.max_retries,
            max_concurrent = config.max_concurrent_searches,
            "search engine ready"
        );

        Self::new(store, provider, config.engine_settings())
    }

    pub fn has_cache(&self) -> bool {
        self.store.is_some()
    }

    /// Run one search.
    ///
    /// Returns at most `num_results` records in provider order. An empty
    /// vector means either nothing was found or every attempt failed; the
    /// logs tell the two apart.
    pub async fn search(&self, query: &str, options: SearchOptions) -> Vec<ResultRecord> {
        let Ok(_permit) = self.permits.acquire().await else {
            tracing::warn!(query, "search rejected, engine is shutting down");
            return Vec::new();
        };

        let mut shutdown = self.shutdown.subscribe();
        let key = CacheKey::new(query, options.include_descriptions, options.num_results);
        let limit = usize::from(options.num_results);

        tracing::info!(
            query,
            num_results = options.num_results,
            use_cache = options.use_cache,
            include_descriptions = options.include_descriptions,
            "search request"
        );

        let mut rotated: Option<String> = None;

        for attempt in 0..self.settings.max_retries {
            if attempt == 0
                && options.use_cache
                && let Some(cached) = self.cached(&key).await
            {
                tracing::info!(query, cached = cached.len(), "using cached search results");
                return truncate(cached, limit);
            }

            let user_agent = rotated.take().unwrap_or_else(|| self.identity.next_identity());
            tracing::info!(query, attempt = attempt + 1, user_agent = %preview(&user_agent), "searching provider");

            if !self.pause(&mut shutdown, self.settings.backoff.throttle_delay()).await {
                return self.abandoned(query);
            }

            let request = ProviderRequest {
                query: query.to_string(),
                count: options.num_results,
                safe_search: self.settings.safe_search,
                want_descriptions: options.include_descriptions,
                user_agent,
            };

            let failure = match self.provider.search(&request).await {
                Ok(hits) => {
                    let records = normalize(hits, options.include_descriptions);
                    tracing::info!(query, results = records.len(), "retrieved results from provider");
                    self.persist(&key, &records).await;
                    return truncate(records, limit);
                }
                Err(e) => e,
            };

            tracing::warn!(query, attempt = attempt + 1, error = %failure, "search attempt failed");

            if attempt + 1 == self.settings.max_retries {
                break;
            }

            let delay = match &failure {
                ProviderError::RateLimited { retry_after } => {
                    let delay = self.settings.backoff.retry_delay(attempt, true);
                    tracing::warn!(
                        query,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        hint_ms = retry_after.map(|d| d.as_millis() as u64),
                        "rate limited, backing off"
                    );
                    delay
                }
                ProviderError::Failed(_) => {
                    rotated = Some(self.identity.next_identity());
                    self.settings.backoff.retry_delay(attempt, false)
                }
            };

            if !self.pause(&mut shutdown, delay).await {
                return self.abandoned(query);
            }
        }

        tracing::error!(query, attempts = self.settings.max_retries, "exhausted retries");
        Vec::new()
    }

    /// Stop accepting searches, wake every sleeping search so it returns
    /// empty, then flush and close the cache.
    ///
    /// Safe to call more than once; only the first call closes the cache.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.shutdown.send_replace(true);
        self.permits.close();

        if let Some(store) = &self.store {
            match store.close().await {
                Ok(()) => tracing::info!("search cache closed"),
                Err(e) => tracing::error!(error = %e, "error closing search cache"),
            }
        }
    }

    async fn cached(&self, key: &CacheKey) -> Option<Vec<ResultRecord>> {
        let store = self.store.as_ref()?;
        match store.get(key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(query = %key.query, error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn persist(&self, key: &CacheKey, records: &[ResultRecord]) {
        let Some(store) = &self.store else {
            return;
        };

        if let Err(e) = store.put(key, records).await {
            tracing::warn!(query = %key.query, error = %e, "failed to stage search results");
            return;
        }

        match store.flush().await {
            Ok(_) => tracing::debug!(query = %key.query, "updated cache"),
            Err(e) => tracing::warn!(query = %key.query, error = %e, "failed to save search cache"),
        }
    }

    /// Sleep for `delay` unless shutdown starts first. Returns false on shutdown.
    async fn pause(&self, shutdown: &mut watch::Receiver<bool>, delay: Duration) -> bool {
        if *shutdown.borrow() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = shutdown.changed() => false,
        }
    }

    fn abandoned(&self, query: &str) -> Vec<ResultRecord> {
        tracing::warn!(query, "search abandoned during shutdown");
        Vec::new()
    }
}

impl Drop for SearchEngine {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.shutdown.send_replace(true);
            self.permits.close();
            tracing::debug!("search engine dropped without shutdown; unflushed cache writes are discarded");
        }
    }
}

fn truncate(mut records: Vec<ResultRecord>, limit: usize) -> Vec<ResultRecord> {
    records.truncate(limit);
    records
}

fn preview(user_agent: &str) -> String {
    let head: String = user_agent.chars().take(30).collect();
    format!("{head}...")
}
