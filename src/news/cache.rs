use lru::LruCache;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Default lifetime of a cached fetch outcome (10 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// Default number of distinct keys kept before the least recently used is
/// dropped.
pub const DEFAULT_CAPACITY: usize = 64;

/// Source of the current instant, injectable so expiry can be tested
/// without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cache entry with expiration
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

type Slot<V> = Arc<tokio::sync::Mutex<Option<CacheEntry<V>>>>;

/// Time-limited memo of fetch outcomes, keyed per adapter and parameter.
///
/// Each key owns an async slot: concurrent callers for the same key queue on
/// the slot, so only the first one runs the fetch and the rest read its
/// result. Different keys never block each other. Entries expire purely by
/// elapsed time; there is no invalidation API.
pub struct FetchCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slots: Mutex<LruCache<K, Slot<V>>>,
}

impl<K, V> FetchCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(ttl, capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            clock,
            slots: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the cached value for `key`, or runs `fetch` and caches its
    /// result when the entry is missing or expired.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let slot = self.slot(key);
        let mut guard = slot.lock().await;

        if let Some(entry) = guard.as_ref() {
            if self.clock.now() < entry.expires_at {
                tracing::trace!("Fetch cache hit");
                return entry.value.clone();
            }
            tracing::debug!("Fetch cache entry expired");
        }

        let value = fetch().await;
        *guard = Some(CacheEntry {
            value: value.clone(),
            expires_at: self.clock.now() + self.ttl,
        });
        value
    }

    fn slot(&self, key: K) -> Slot<V> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get(&key) {
            return Arc::clone(slot);
        }
        let slot: Slot<V> = Arc::new(tokio::sync::Mutex::new(None));
        slots.put(key, Arc::clone(&slot));
        slot
    }

    /// Number of keys currently tracked, expired or not.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
