//! Read-through caches for fetched tiles.
//!
//! [`LruTileCache`] keeps at most `max_size` entries and runs at most one
//! fetch per key at a time: callers arriving while a fetch is in flight
//! subscribe to its result instead of fetching again. The fetch itself never
//! runs under the lock, so a slow provider only delays callers of that key.

use crate::core::constants::DEFAULT_CACHE_SIZE;
use crate::prelude::HashMap;
use crate::{ChartError, Result};
use async_trait::async_trait;
use lru::LruCache;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;

/// A key-value cache over an asynchronous fetch operation.
///
/// `get` returns the cached value for `key` or runs `fetch` to produce it.
/// Absent keys (`None`) and absent fetched values are rejected with
/// [`ChartError::InvalidArgument`], since they cannot be told apart from
/// "not cached". A failing fetch leaves the cache untouched.
#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get<Q, F, Fut, R>(&self, key: Q, fetch: F) -> Result<V>
    where
        Q: Into<Option<K>> + Send,
        F: FnOnce(K) -> Fut + Send,
        Fut: Future<Output = Result<R>> + Send,
        R: Into<Option<V>> + Send;
}

fn require_key<K>(key: impl Into<Option<K>>) -> Result<K> {
    key.into()
        .ok_or_else(|| ChartError::InvalidArgument("null keys are not allowed".to_string()))
}

fn require_value<V, R: Into<Option<V>>>(value: R) -> Result<V> {
    value
        .into()
        .ok_or_else(|| ChartError::InvalidArgument("null values are not allowed".to_string()))
}

/// Counters describing how a cache has been used
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Callers that waited on another caller's in-flight fetch
    pub coalesced: u64,
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct StatCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    evictions: AtomicU64,
}

struct CacheState<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
    /// One sender per key whose fetch is running
    in_flight: HashMap<K, broadcast::Sender<V>>,
}

/// Thread-safe LRU cache with per-key fetch deduplication
pub struct LruTileCache<K: Hash + Eq, V> {
    state: Mutex<CacheState<K, V>>,
    stats: StatCounters,
}

impl<K, V> LruTileCache<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache holding at most `max_size` entries (at least one)
    pub fn new(max_size: usize) -> Self {
        let capacity = NonZeroUsize::new(max_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                in_flight: HashMap::default(),
            }),
            stats: StatCounters::default(),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<K, V>> {
        // A poisoned lock means a panic mid-update left the LRU order and the
        // in-flight table out of sync; there is no sound way to continue.
        self.state.lock().expect("tile cache lock poisoned")
    }

    /// Checks presence without refreshing recency
    pub fn contains(&self, key: &K) -> bool {
        self.lock().entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().entries.cap().get()
    }

    /// Number of keys whose fetch is currently running
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            coalesced: self.stats.coalesced.load(Ordering::Relaxed),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
        }
    }

    /// Stores a fetched value and releases the key's in-flight slot in one
    /// critical section. An entry inserted meanwhile wins over `value`.
    fn complete(&self, key: K, value: V) -> (V, Option<broadcast::Sender<V>>) {
        let mut state = self.lock();
        let sender = state.in_flight.remove(&key);

        if let Some(existing) = state.entries.get(&key) {
            return (existing.clone(), sender);
        }

        if let Some((evicted, _)) = state.entries.push(key, value.clone()) {
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            log::debug!("tile cache evicted {:?}", evicted);
        }
        (value, sender)
    }
}

impl<K, V> Default for LruTileCache<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Outcome of looking a key up under the lock
enum Lookup<V> {
    Hit(V),
    Wait(broadcast::Receiver<V>),
    Fetch,
}

#[async_trait]
impl<K, V> Cache<K, V> for LruTileCache<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get<Q, F, Fut, R>(&self, key: Q, fetch: F) -> Result<V>
    where
        Q: Into<Option<K>> + Send,
        F: FnOnce(K) -> Fut + Send,
        Fut: Future<Output = Result<R>> + Send,
        R: Into<Option<V>> + Send,
    {
        let key = require_key(key)?;

        loop {
            let lookup = {
                let mut state = self.lock();
                if let Some(value) = state.entries.get(&key) {
                    Lookup::Hit(value.clone())
                } else if let Some(sender) = state.in_flight.get(&key) {
                    Lookup::Wait(sender.subscribe())
                } else {
                    let (sender, _) = broadcast::channel(1);
                    state.in_flight.insert(key.clone(), sender);
                    Lookup::Fetch
                }
            };

            match lookup {
                Lookup::Hit(value) => {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    log::trace!("tile cache hit {:?}", key);
                    return Ok(value);
                }
                Lookup::Wait(mut receiver) => {
                    self.stats.coalesced.fetch_add(1, Ordering::Relaxed);
                    log::trace!("tile cache waiting on in-flight fetch {:?}", key);
                    match receiver.recv().await {
                        Ok(value) => return Ok(value),
                        // The other fetch failed or was dropped: try again,
                        // possibly becoming the fetching caller
                        Err(_) => continue,
                    }
                }
                Lookup::Fetch => break,
            }
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("tile cache miss {:?}, fetching", key);

        let slot = InFlightSlot {
            cache: self,
            key: Some(key.clone()),
        };
        let fetched = fetch(key.clone())
            .await
            .and_then(|fetched| require_value(fetched));
        let value = match fetched {
            Ok(value) => value,
            Err(err) => {
                log::debug!("fetch for {:?} failed: {}", key, err);
                drop(slot);
                return Err(err);
            }
        };

        slot.disarm();
        let (value, sender) = self.complete(key, value);
        if let Some(sender) = sender {
            // No receivers simply means nobody was waiting
            let _ = sender.send(value.clone());
        }
        Ok(value)
    }
}

/// Releases a key's in-flight slot when the fetching caller fails or is
/// dropped mid-fetch, which wakes the waiters so they can retry.
struct InFlightSlot<'a, K, V>
where
    K: Hash + Eq,
{
    cache: &'a LruTileCache<K, V>,
    key: Option<K>,
}

impl<K: Hash + Eq, V> InFlightSlot<'_, K, V> {
    fn disarm(mut self) {
        self.key = None;
    }
}

impl<K: Hash + Eq, V> Drop for InFlightSlot<'_, K, V> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            if let Ok(mut state) = self.cache.state.lock() {
                state.in_flight.remove(&key);
            }
        }
    }
}

/// Pass-through strategy: every call runs `fetch`, nothing is stored
pub struct NoOpCache<K, V> {
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> NoOpCache<K, V> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<K, V> Default for NoOpCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for NoOpCache<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get<Q, F, Fut, R>(&self, key: Q, fetch: F) -> Result<V>
    where
        Q: Into<Option<K>> + Send,
        F: FnOnce(K) -> Fut + Send,
        Fut: Future<Output = Result<R>> + Send,
        R: Into<Option<V>> + Send,
    {
        let key = require_key(key)?;
        fetch(key).await.and_then(|fetched| require_value(fetched))
    }
}
