//! Singleflight loading cache.
//!
//! Each key owns an async slot. The first caller that finds the slot empty
//! (or expired) runs the loader while holding the slot; concurrent callers
//! for the same key wait on the slot and then read the loaded value, so a
//! key is loaded at most once at a time. Failed loads are not cached.
//!
//! [`CreateOrFetch`] is the loader for resources that must exist: it fetches
//! the resource, creates it when missing, and repeats both under a
//! [`RetryPolicy`] until the resource is visible.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use cirrus_core::{BoxFuture, Result, RetryPolicy};
use tokio::time::Instant;
use tracing::debug;

use crate::RetryExt;

/// Computes the value of a missing key.
pub trait CacheLoader<K, V>: Send + Sync {
    /// Load the value for `key`.
    fn load<'a>(&'a self, key: &'a K) -> BoxFuture<'a, Result<V>>;
}

impl<K, V, F, Fut> CacheLoader<K, V> for F
where
    K: Clone + Send + Sync,
    F: Fn(K) -> Fut + Send + Sync,
    Fut: Future<Output = Result<V>> + Send + 'static,
{
    fn load<'a>(&'a self, key: &'a K) -> BoxFuture<'a, Result<V>> {
        Box::pin(self(key.clone()))
    }
}

struct Entry<V> {
    value: V,
    loaded_at: Instant,
}

type Slot<V> = Arc<tokio::sync::Mutex<Option<Entry<V>>>>;

/// Concurrent map whose missing entries are filled by a [`CacheLoader`].
///
/// # Example
///
/// ```
/// use cirrus::LoadingCache;
///
/// # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
/// let cache = LoadingCache::new(|name: String| async move { Ok(name.len()) });
///
/// assert_eq!(cache.get(&"my-group".to_string()).await.unwrap(), 8);
/// # });
/// ```
pub struct LoadingCache<K, V, L> {
    loader: L,
    ttl: Option<Duration>,
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V, L> fmt::Debug for LoadingCache<K, V, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("LoadingCache")
            .field("ttl", &self.ttl)
            .field("keys", &len)
            .finish_non_exhaustive()
    }
}

impl<K, V, L> LoadingCache<K, V, L>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync,
    V: Clone + Send,
    L: CacheLoader<K, V>,
{
    /// Cache whose entries never expire.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            ttl: None,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Cache whose entries are reloaded once older than `ttl`.
    pub fn with_ttl(loader: L, ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::new(loader)
        }
    }

    /// Entry lifetime, if any.
    pub const fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Value for `key`, loading it if absent or expired.
    ///
    /// # Errors
    ///
    /// Returns the loader's error. Nothing is stored, so the next call
    /// tries again.
    pub async fn get(&self, key: &K) -> Result<V> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let mut entry = slot.lock().await;
        if let Some(cached) = entry.as_ref()
            && !self.is_expired(cached)
        {
            return Ok(cached.value.clone());
        }

        debug!(?key, expired = entry.is_some(), "loading cache entry");
        let value = match self.loader.load(key).await {
            Ok(value) => value,
            Err(error) => {
                drop(entry);
                self.release(key, &slot);
                return Err(error);
            }
        };
        *entry = Some(Entry {
            value: value.clone(),
            loaded_at: Instant::now(),
        });
        Ok(value)
    }

    /// Value for `key` if it is loaded and fresh. Never loads and never
    /// waits for an in-flight load.
    pub fn get_if_present(&self, key: &K) -> Option<V> {
        let slot = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()?;
        let entry = slot.try_lock().ok()?;
        entry
            .as_ref()
            .filter(|cached| !self.is_expired(cached))
            .map(|cached| cached.value.clone())
    }

    /// Number of keys that are loaded or being loaded.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no key is loaded or being loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop `key`; the next [`get`](Self::get) loads it again.
    pub fn invalidate(&self, key: &K) {
        debug!(?key, "invalidating cache entry");
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Drop every key.
    pub fn invalidate_all(&self) {
        debug!("invalidating all cache entries");
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn is_expired(&self, entry: &Entry<V>) -> bool {
        self.ttl.is_some_and(|ttl| entry.loaded_at.elapsed() >= ttl)
    }

    // Forget the slot of a failed load unless another caller is waiting on it.
    fn release(&self, key: &K, slot: &Slot<V>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && Arc::strong_count(slot) == 2)
        {
            slots.remove(key);
        }
    }
}

/// [`CacheLoader`] that fetches a resource and creates it when missing.
///
/// `fetch` yields `None` for a missing resource (pair it with a
/// [`null_on_not_found`](cirrus_core::FallbackPolicy::null_on_not_found)
/// method), `create` makes it. Both run again under the retry policy, so a
/// create that loses a race ("already exists") or a resource that is not yet
/// visible resolves once the vendor code is mapped to a retryable kind with
/// [`ErrorMapper::vendor_code`](cirrus_core::ErrorMapper::vendor_code).
pub struct CreateOrFetch<Fe, Cr> {
    fetch: Fe,
    create: Cr,
    retry: RetryPolicy,
}

impl<Fe, Cr> fmt::Debug for CreateOrFetch<Fe, Cr> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateOrFetch")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl<Fe, Cr> CreateOrFetch<Fe, Cr> {
    /// Loader over `fetch` and `create` with the default retry policy.
    pub fn new(fetch: Fe, create: Cr) -> Self {
        Self {
            fetch,
            create,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl<K, V, Fe, FeFut, Cr, CrFut> CacheLoader<K, V> for CreateOrFetch<Fe, Cr>
where
    K: Clone + fmt::Debug + Send + Sync,
    V: Send,
    Fe: Fn(K) -> FeFut + Send + Sync,
    FeFut: Future<Output = Result<Option<V>>> + Send,
    Cr: Fn(K) -> CrFut + Send + Sync,
    CrFut: Future<Output = Result<V>> + Send,
{
    fn load<'a>(&'a self, key: &'a K) -> BoxFuture<'a, Result<V>> {
        Box::pin(async move {
            self.retry
                .decorate(move || async move {
                    if let Some(value) = (self.fetch)(key.clone()).await? {
                        return Ok(value);
                    }
                    debug!(?key, "creating missing resource");
                    (self.create)(key.clone()).await
                })
                .call()
                .await
        })
    }
}
