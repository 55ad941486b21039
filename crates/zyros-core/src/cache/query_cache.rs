//! Keyed cache of async query results
//!
//! Each key owns at most one in-flight fetch. The fetch runs on its own task
//! and settles the entry itself, so callers that give up waiting never
//! cancel it. Observers are fed through a per-entry watch channel.

use super::observer::QueryObserver;
use super::types::{CacheConfig, CacheStatistics, QueryKey, QuerySnapshot, QueryStatus};
use crate::error::{ZyrosError, ZyrosResult};
use crate::events::{ClientEvent, SharedEventBus};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Shortest period accepted by [`QueryCache::spawn_gc`]
pub const MIN_GC_INTERVAL: Duration = Duration::from_millis(100);

/// Produces the payload for one key
pub type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, ZyrosResult<Value>> + Send + Sync>;

type SharedFetch = Shared<BoxFuture<'static, ZyrosResult<Value>>>;

/// Wrap an async closure as a [`Fetcher`]
pub fn fetcher<F, Fut>(f: F) -> Fetcher
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ZyrosResult<Value>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

struct InFlight {
    generation: u64,
    future: SharedFetch,
}

struct Entry {
    /// Distinguishes this entry from a later one under the same key
    id: u64,
    key: QueryKey,
    data: Option<Value>,
    status: QueryStatus,
    error: Option<ZyrosError>,
    updated_at: Option<DateTime<Utc>>,
    fetched_at: Option<Instant>,
    invalidated: bool,
    observers: usize,
    inactive_since: Option<Instant>,
    in_flight: Option<InFlight>,
    refetch_on_settle: bool,
    fetcher: Option<Fetcher>,
    notifier: watch::Sender<QuerySnapshot>,
}

impl Entry {
    fn new(id: u64, key: QueryKey, now: Instant) -> Self {
        let (notifier, _) = watch::channel(QuerySnapshot::empty(key.clone()));
        Self {
            id,
            key,
            data: None,
            status: QueryStatus::Idle,
            error: None,
            updated_at: None,
            fetched_at: None,
            invalidated: false,
            observers: 0,
            inactive_since: Some(now),
            in_flight: None,
            refetch_on_settle: false,
            fetcher: None,
            notifier,
        }
    }

    fn is_stale(&self, now: Instant, stale_time: Duration) -> bool {
        if self.invalidated || self.status == QueryStatus::Error {
            return true;
        }
        match self.fetched_at {
            Some(fetched_at) => now.saturating_duration_since(fetched_at) >= stale_time,
            None => true,
        }
    }

    fn is_fresh(&self, now: Instant, stale_time: Duration) -> bool {
        self.data.is_some() && !self.is_stale(now, stale_time)
    }

    fn is_collectable(&self, now: Instant, retention: Duration) -> bool {
        self.observers == 0
            && self.in_flight.is_none()
            && self
                .inactive_since
                .is_some_and(|since| now.saturating_duration_since(since) >= retention)
    }

    fn snapshot(&self, now: Instant, stale_time: Duration) -> QuerySnapshot {
        QuerySnapshot {
            key: self.key.clone(),
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            updated_at: self.updated_at,
            is_stale: self.is_stale(now, stale_time),
            is_fetching: self.in_flight.is_some(),
        }
    }

    fn notify(&self, now: Instant, stale_time: Duration) {
        self.notifier.send_replace(self.snapshot(now, stale_time));
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    invalidations: AtomicU64,
    evictions: AtomicU64,
}

struct Inner {
    config: CacheConfig,
    entries: Mutex<HashMap<QueryKey, Entry>>,
    generation: AtomicU64,
    counters: Counters,
    events: Option<SharedEventBus>,
}

/// Server-state cache
///
/// Cloning is cheap; clones share the same entries. Methods that may start a
/// fetch must run inside a tokio runtime.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::build(config, None)
    }

    /// Cache that reports invalidations and mutations on the event bus
    pub fn with_events(config: CacheConfig, events: SharedEventBus) -> Self {
        Self::build(config, Some(events))
    }

    fn build(config: CacheConfig, events: Option<SharedEventBus>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                entries: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
                counters: Counters::default(),
                events,
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub(crate) fn events(&self) -> Option<&SharedEventBus> {
        self.inner.events.as_ref()
    }

    fn stale_time(&self) -> Duration {
        self.inner.config.stale_time
    }

    fn next_id(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Read a key, fetching when the cached data is stale or absent
    ///
    /// Concurrent callers for one key share a single fetcher invocation. On
    /// failure the error is returned while the previous data stays readable.
    pub async fn query(&self, key: QueryKey, fetch: Fetcher) -> ZyrosResult<Value> {
        let pending = {
            let now = Instant::now();
            let mut entries = self.inner.entries.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(self.next_id(), key.clone(), now));
            entry.fetcher = Some(fetch);

            if entry.is_fresh(now, self.stale_time()) {
                if let Some(data) = &entry.data {
                    self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(key = %key, "query cache hit");
                    return Ok(data.clone());
                }
            }

            self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "query cache miss");
            self.ensure_fetch(entry, now)
        };

        pending.await
    }

    /// Typed variant of [`QueryCache::query`]
    pub async fn query_typed<T, F, Fut>(&self, key: QueryKey, fetch: F) -> ZyrosResult<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ZyrosResult<T>> + Send + 'static,
    {
        let fetch = fetcher(move || {
            let pending = fetch();
            async move { Ok(serde_json::to_value(pending.await?)?) }
        });
        let value = self.query(key, fetch).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Attach an observer, fetching when the entry is stale or absent
    pub fn observe(&self, key: QueryKey, fetch: Fetcher) -> QueryObserver {
        let (entry_id, receiver) = {
            let now = Instant::now();
            let mut entries = self.inner.entries.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(self.next_id(), key.clone(), now));
            entry.fetcher = Some(fetch);
            entry.observers += 1;
            entry.inactive_since = None;

            if entry.is_fresh(now, self.stale_time()) {
                self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
            } else {
                self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
                self.ensure_fetch(entry, now);
            }

            tracing::debug!(key = %key, observers = entry.observers, "observer attached");
            (entry.id, entry.notifier.subscribe())
        };

        QueryObserver::new(self.clone(), key, entry_id, receiver)
    }

    /// Release one observer of the entry `entry_id`; a no-op once that entry
    /// was removed, even if the key has been observed again since
    pub(crate) fn detach(&self, key: &QueryKey, entry_id: u64) {
        let mut entries = self.inner.entries.lock();
        if let Some(entry) = entries.get_mut(key).filter(|entry| entry.id == entry_id) {
            entry.observers = entry.observers.saturating_sub(1);
            if entry.observers == 0 {
                entry.inactive_since = Some(Instant::now());
            }
            tracing::debug!(key = %key, observers = entry.observers, "observer detached");
        }
    }

    /// Fetch a key now, joining a fetch that is already running
    pub async fn refetch(&self, key: &QueryKey) -> ZyrosResult<Value> {
        let pending = {
            let mut entries = self.inner.entries.lock();
            let entry = entries
                .get_mut(key)
                .ok_or_else(|| ZyrosError::not_found_resource(key.to_string(), "query"))?;
            if entry.fetcher.is_none() {
                return Err(ZyrosError::other(format!("No fetcher registered for {}", key)));
            }
            self.ensure_fetch(entry, Instant::now())
        };
        pending.await
    }

    /// Mark every entry under the given prefixes stale
    ///
    /// Observed entries refetch immediately; the rest refetch on their next
    /// read. Returns the number of matched entries.
    pub fn invalidate(&self, prefixes: &[QueryKey]) -> usize {
        let matched = {
            let now = Instant::now();
            let mut entries = self.inner.entries.lock();
            let mut matched = 0;

            for entry in entries.values_mut() {
                if !prefixes.iter().any(|prefix| entry.key.starts_with(prefix)) {
                    continue;
                }
                matched += 1;
                entry.invalidated = true;

                if entry.in_flight.is_some() {
                    entry.refetch_on_settle = true;
                    entry.notify(now, self.stale_time());
                } else if entry.observers > 0 && entry.fetcher.is_some() {
                    self.ensure_fetch(entry, now);
                } else {
                    entry.notify(now, self.stale_time());
                }
            }
            matched
        };

        self.inner
            .counters
            .invalidations
            .fetch_add(matched as u64, Ordering::Relaxed);
        tracing::debug!(?prefixes, matched, "invalidated queries");

        if let Some(events) = &self.inner.events {
            events.publish(ClientEvent::QueryInvalidated {
                prefixes: prefixes.to_vec(),
                matched,
            });
        }
        matched
    }

    /// Current view of an entry
    pub fn snapshot(&self, key: &QueryKey) -> Option<QuerySnapshot> {
        let now = Instant::now();
        self.inner
            .entries
            .lock()
            .get(key)
            .map(|entry| entry.snapshot(now, self.stale_time()))
    }

    /// Cached payload regardless of staleness
    pub fn get_query_data(&self, key: &QueryKey) -> Option<Value> {
        self.inner
            .entries
            .lock()
            .get(key)
            .and_then(|entry| entry.data.clone())
    }

    /// Typed variant of [`QueryCache::get_query_data`]
    pub fn get_query_data_as<T: DeserializeOwned>(&self, key: &QueryKey) -> ZyrosResult<Option<T>> {
        self.get_query_data(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(ZyrosError::from)
    }

    /// Store a payload as if it had just been fetched
    pub fn set_query_data(&self, key: QueryKey, data: Value) {
        let now = Instant::now();
        let mut entries = self.inner.entries.lock();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(self.next_id(), key, now));

        entry.data = Some(data);
        entry.status = QueryStatus::Success;
        entry.error = None;
        entry.fetched_at = Some(now);
        entry.updated_at = Some(Utc::now());
        entry.invalidated = false;
        if entry.observers == 0 {
            entry.inactive_since = Some(now);
        }
        entry.notify(now, self.stale_time());
    }

    /// Drop every entry under a prefix; running fetches settle into nothing
    pub fn remove(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.inner.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.inner.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.inner.entries.lock().contains_key(key)
    }

    /// Get cache statistics
    pub fn statistics(&self) -> CacheStatistics {
        let (entries, observed_entries, in_flight) = {
            let entries = self.inner.entries.lock();
            (
                entries.len(),
                entries.values().filter(|e| e.observers > 0).count(),
                entries.values().filter(|e| e.in_flight.is_some()).count(),
            )
        };

        let counters = &self.inner.counters;
        CacheStatistics {
            entries,
            observed_entries,
            in_flight,
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            fetches: counters.fetches.load(Ordering::Relaxed),
            invalidations: counters.invalidations.load(Ordering::Relaxed),
            evictions: counters.evictions.load(Ordering::Relaxed),
        }
    }

    /// Evict unobserved, idle entries older than the retention window
    pub fn collect_garbage(&self) -> usize {
        let now = Instant::now();
        let retention = self.inner.config.retention_time;
        let evicted = {
            let mut entries = self.inner.entries.lock();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_collectable(now, retention));
            before - entries.len()
        };

        if evicted > 0 {
            self.inner
                .counters
                .evictions
                .fetch_add(evicted as u64, Ordering::Relaxed);
            tracing::debug!(evicted, "collected idle queries");
        }
        evicted
    }

    /// Run [`QueryCache::collect_garbage`] periodically until cancelled
    ///
    /// Intervals shorter than [`MIN_GC_INTERVAL`] are raised to it.
    pub fn spawn_gc(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let cache = self.clone();
        let interval = interval.max(MIN_GC_INTERVAL);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        cache.collect_garbage();
                    }
                }
            }
        })
    }

    /// Join the running fetch or start a new one. Caller holds the entries lock.
    fn ensure_fetch(&self, entry: &mut Entry, now: Instant) -> SharedFetch {
        if let Some(in_flight) = &entry.in_flight {
            return in_flight.future.clone();
        }

        let Some(fetch) = entry.fetcher.clone() else {
            let key = entry.key.to_string();
            return futures::future::ready(Err(ZyrosError::other(format!(
                "No fetcher registered for {}",
                key
            ))))
            .boxed()
            .shared();
        };

        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.counters.fetches.fetch_add(1, Ordering::Relaxed);

        let cache = self.clone();
        let key = entry.key.clone();
        let task = tokio::spawn(async move {
            let result = fetch().await;
            cache.settle(&key, generation, &result);
            result
        });

        let future = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(ZyrosError::from(e)),
            }
        }
        .boxed()
        .shared();

        if entry.status == QueryStatus::Idle {
            entry.status = QueryStatus::Pending;
        }
        entry.in_flight = Some(InFlight {
            generation,
            future: future.clone(),
        });
        entry.notify(now, self.stale_time());
        future
    }

    fn settle(&self, key: &QueryKey, generation: u64, result: &ZyrosResult<Value>) {
        let now = Instant::now();
        let mut entries = self.inner.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            tracing::debug!(key = %key, "fetch settled after the entry was removed");
            return;
        };
        if entry
            .in_flight
            .as_ref()
            .is_none_or(|in_flight| in_flight.generation != generation)
        {
            return;
        }
        entry.in_flight = None;

        match result {
            Ok(data) => {
                entry.data = Some(data.clone());
                entry.status = QueryStatus::Success;
                entry.error = None;
                entry.fetched_at = Some(now);
                entry.updated_at = Some(Utc::now());
                // invalidated mid-flight: keep the result but leave it stale
                entry.invalidated = entry.refetch_on_settle;
            }
            Err(error) => {
                tracing::debug!(key = %key, error = %error, "query fetch failed");
                entry.status = QueryStatus::Error;
                entry.error = Some(error.clone());
            }
        }

        if entry.observers == 0 {
            entry.inactive_since = Some(now);
        }

        if std::mem::take(&mut entry.refetch_on_settle) && entry.observers > 0 {
            self.ensure_fetch(entry, now);
        } else {
            entry.notify(now, self.stale_time());
        }
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("config", &self.inner.config)
            .field("entries", &self.len())
            .finish()
    }
}
