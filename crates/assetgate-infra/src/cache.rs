//! Cache and counter store abstractions
//!
//! Both traits are injected so a shared store can replace the in-memory
//! implementation without touching the pipeline.

use assetgate_core::UploadError;
use async_trait::async_trait;
use lru::LruCache;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DEFAULT_SHARD_COUNT: usize = 16;
const DEFAULT_SHARD_CAPACITY: usize = 10_000;
const SWEEP_INTERVAL: u64 = 1024;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

impl From<CacheError> for UploadError {
    fn from(err: CacheError) -> Self {
        UploadError::ServiceUnavailable(err.to_string())
    }
}

/// Key/value cache with optional expiry
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Drop `key`. Returns whether it was present.
    async fn expire(&self, key: &str) -> Result<bool, CacheError>;
}

/// One rolling window and the number of events it may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimit {
    pub window: Duration,
    pub limit: u64,
}

/// Result of [`CounterStore::admit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Recorded,
    /// The limit at `index` is full; a slot frees up at `retry_at_ms`.
    Rejected { index: usize, retry_at_ms: i64 },
}

/// Sliding-log event counters.
///
/// An event at `t` counts toward a window of length `w` while
/// `now - w < t <= now`. Rejected attempts are never recorded. Entries live
/// until they leave the longest window and are never evicted earlier.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Record an event at `now_ms` under `key` if every limit still has room.
    /// Checking and recording happen atomically per key.
    async fn admit(
        &self,
        key: &str,
        now_ms: i64,
        limits: &[WindowLimit],
    ) -> Result<Admission, CacheError>;

    /// Events recorded under `key` within `window` ending at `now_ms`.
    async fn count(&self, key: &str, now_ms: i64, window: Duration) -> Result<u64, CacheError>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Event timestamps (unix millis, ascending) for one key
#[derive(Debug, Default)]
struct EventLog {
    events: VecDeque<i64>,
    retention_ms: i64,
}

impl EventLog {
    fn prune(&mut self, now_ms: i64) {
        while self
            .events
            .front()
            .is_some_and(|&t| t <= now_ms - self.retention_ms)
        {
            self.events.pop_front();
        }
    }

    /// Events with `since < t <= now_ms`, oldest first.
    fn within(&self, since: i64, now_ms: i64) -> impl Iterator<Item = i64> + '_ {
        self.events
            .iter()
            .copied()
            .filter(move |&t| t > since && t <= now_ms)
    }

    fn insert(&mut self, t: i64) {
        let at = self.events.partition_point(|&e| e <= t);
        self.events.insert(at, t);
    }

    fn is_stale(&self, now_ms: i64) -> bool {
        self.events
            .back()
            .map_or(true, |&t| t <= now_ms - self.retention_ms)
    }
}

#[derive(Debug, Default)]
struct CounterShard {
    logs: HashMap<String, EventLog>,
    ops: u64,
}

impl CounterShard {
    fn sweep(&mut self, now_ms: i64) {
        self.ops += 1;
        if self.ops % SWEEP_INTERVAL == 0 {
            self.logs.retain(|_, log| !log.is_stale(now_ms));
        }
    }
}

fn millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// Sharded in-memory store.
///
/// Keys hash onto independent shards so concurrent uploads rarely contend on
/// the same lock. Cached values sit in capacity-bounded LRU shards; counter
/// logs sit in separate maps bounded only by their retention, so cache
/// pressure never resets a counter. Each operation holds one shard lock for
/// its whole read-modify-write.
pub struct InMemoryCache {
    shards: Vec<Mutex<LruCache<String, Entry>>>,
    counters: Vec<Mutex<CounterShard>>,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::with_shards(DEFAULT_SHARD_COUNT, DEFAULT_SHARD_CAPACITY)
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `capacity_per_shard` bounds cached values only.
    pub fn with_shards(shard_count: usize, capacity_per_shard: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity_per_shard).unwrap_or(NonZeroUsize::MIN);
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| Mutex::new(LruCache::new(capacity)))
            .collect();
        let counters = (0..shard_count)
            .map(|_| Mutex::new(CounterShard::default()))
            .collect();
        Self { shards, counters }
    }

    fn index(&self, key: &str) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    fn shard(&self, key: &str) -> &Mutex<LruCache<String, Entry>> {
        &self.shards[self.index(key)]
    }

    fn counter_shard(&self, key: &str) -> &Mutex<CounterShard> {
        &self.counters[self.index(key)]
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut shard = self.shard(key).lock().await;
        let now = Instant::now();
        let found = shard
            .get(key)
            .map(|entry| (entry.is_live(now), entry.value.clone()));
        match found {
            Some((true, value)) => Ok(Some(value)),
            Some((false, _)) => {
                shard.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut shard = self.shard(key).lock().await;
        shard.put(
            key.to_string(),
            Entry {
                value,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str) -> Result<bool, CacheError> {
        let mut shard = self.shard(key).lock().await;
        let now = Instant::now();
        Ok(shard.pop(key).is_some_and(|entry| entry.is_live(now)))
    }
}

#[async_trait]
impl CounterStore for InMemoryCache {
    async fn admit(
        &self,
        key: &str,
        now_ms: i64,
        limits: &[WindowLimit],
    ) -> Result<Admission, CacheError> {
        let mut shard = self.counter_shard(key).lock().await;
        shard.sweep(now_ms);

        let retention_ms = limits.iter().map(|l| millis(l.window)).max().unwrap_or(0);
        let log = shard.logs.entry(key.to_string()).or_default();
        log.retention_ms = log.retention_ms.max(retention_ms);
        log.prune(now_ms);

        for (index, limit) in limits.iter().enumerate() {
            let window_ms = millis(limit.window);
            let inside: Vec<i64> = log.within(now_ms - window_ms, now_ms).collect();
            if inside.len() as u64 >= limit.limit {
                // The oldest events must leave before one more fits.
                let freeing = inside.len() as u64 - limit.limit;
                let retry_at_ms = inside
                    .get(freeing as usize)
                    .map_or(now_ms, |&t| t + window_ms);
                return Ok(Admission::Rejected { index, retry_at_ms });
            }
        }

        log.insert(now_ms);
        Ok(Admission::Recorded)
    }

    async fn count(&self, key: &str, now_ms: i64, window: Duration) -> Result<u64, CacheError> {
        let shard = self.counter_shard(key).lock().await;
        Ok(shard.logs.get(key).map_or(0, |log| {
            log.within(now_ms - millis(window), now_ms).count() as u64
        }))
    }
}
