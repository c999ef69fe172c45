//! In-process resource cache with per-class TTLs and background refresh

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use fleet_core::FleetResult;
use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::policy::TtlPolicy;
use super::{cache_key, CacheStats};

/// A cached value together with its insertion time and TTL.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    /// Expired iff strictly more than `ttl` has elapsed since insertion.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.ttl
    }
}

struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    refresh_in_flight: HashSet<String>,
    stats: CacheStats,
}

/// Process-wide key/value cache shared by handle.
///
/// Every read and write of the entry map and the in-flight set happens under
/// a single mutex. Background fetches run outside of it; the lock is taken
/// only to flip the in-flight marker and to commit the fetched value.
pub struct ResourceCache<V> {
    state: Arc<Mutex<CacheState<V>>>,
    policy: Arc<TtlPolicy>,
}

impl<V> Clone for ResourceCache<V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            policy: Arc::clone(&self.policy),
        }
    }
}

impl<V> ResourceCache<V>
where
    V: Clone + Send + 'static,
{
    pub fn new(policy: TtlPolicy) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState {
                entries: HashMap::new(),
                refresh_in_flight: HashSet::new(),
                stats: CacheStats::default(),
            })),
            policy: Arc::new(policy),
        }
    }

    pub fn policy(&self) -> &TtlPolicy {
        &self.policy
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the value if present and not expired. Expired entries are
    /// dropped on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut state = self.lock();

        let lookup = state
            .entries
            .get(key)
            .map(|entry| (!entry.is_expired_at(now)).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => {
                state.stats.hits += 1;
                counter!("fleet_cache_hits_total").increment(1);
                debug!("Cache HIT: {}", key);
                return Some(value);
            }
            Some(None) => {
                state.entries.remove(key);
                state.stats.expirations += 1;
            }
            None => {}
        }

        state.stats.misses += 1;
        counter!("fleet_cache_misses_total").increment(1);
        debug!("Cache MISS: {}", key);
        None
    }

    /// Insert or replace `key` using the TTL resolved from its resource class.
    pub fn set(&self, key: &str, value: V) {
        let ttl = self.policy.ttl_for_key(key);
        self.set_with_ttl(key, value, ttl);
    }

    pub fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        let mut state = self.lock();
        state
            .entries
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        state.stats.sets += 1;
        debug!("Cache SET: {} with TTL: {:?}", key, ttl);
    }

    /// Returns whether an entry was removed.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut state = self.lock();
        let removed = state.entries.remove(key).is_some();
        if removed {
            state.stats.invalidations += 1;
            debug!("Cache INVALIDATE: {}", key);
        }
        removed
    }

    /// Drop `<class>_<profile>_<region>` for every region given.
    pub fn invalidate_class(&self, class: &str, profile: &str, regions: &[String]) -> usize {
        regions
            .iter()
            .filter(|region| self.invalidate(&cache_key(class, profile, region)))
            .count()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        let count = state.entries.len();
        state.entries.clear();
        state.stats.invalidations += count as u64;
        debug!("Cache CLEAR: {} entries removed", count);
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_refreshing(&self, key: &str) -> bool {
        self.lock().refresh_in_flight.contains(key)
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats.clone()
    }

    /// Refresh `key` in the background without making the caller wait.
    ///
    /// Returns `None` when a refresh for `key` is already running or no tokio
    /// runtime is available. A failed fetch is logged and leaves the current
    /// entry untouched. The in-flight marker is cleared however the task ends.
    pub fn start_background_refresh<F, Fut>(&self, key: &str, fetch: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FleetResult<V>> + Send + 'static,
    {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Background refresh for {} skipped: {}", key, e);
                return None;
            }
        };

        {
            let mut state = self.lock();
            if !state.refresh_in_flight.insert(key.to_string()) {
                debug!("Background refresh already in flight: {}", key);
                return None;
            }
            state.stats.refreshes_started += 1;
        }

        let cache = self.clone();
        let key = key.to_string();

        Some(runtime.spawn(async move {
            let _marker = InFlightMarker {
                cache: cache.clone(),
                key: key.clone(),
            };

            match fetch().await {
                Ok(value) => {
                    cache.set(&key, value);
                    debug!("Background refresh completed: {}", key);
                }
                Err(e) => {
                    cache.lock().stats.refresh_failures += 1;
                    counter!("fleet_cache_refresh_failures_total").increment(1);
                    warn!("Background refresh failed ({}): {}", key, e);
                }
            }
        }))
    }
}

/// Clears the in-flight marker on drop, including when the fetch panics.
struct InFlightMarker<V> {
    cache: ResourceCache<V>,
    key: String,
}

impl<V> Drop for InFlightMarker<V> {
    fn drop(&mut self) {
        let mut state = self
            .cache
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        state.refresh_in_flight.remove(&self.key);
    }
}
