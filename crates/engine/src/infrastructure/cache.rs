//! Bounded memoization cache keyed by identity.
//!
//! Provides a thread-safe least-recently-used cache for pure computations
//! whose inputs are shared, immutable `Arc`s. Keys compare inputs by
//! pointer, not by content, so replacing an input object is enough to miss.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

/// An `Arc` compared and hashed by address.
///
/// Holding the `Arc` inside the key keeps the allocation alive, so an
/// address can never be reused by a different object while it is cached.
pub struct ByAddress<T: ?Sized>(pub Arc<T>);

impl<T: ?Sized> ByAddress<T> {
    pub fn new(value: &Arc<T>) -> Self {
        Self(Arc::clone(value))
    }
}

impl<T: ?Sized> Clone for ByAddress<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for ByAddress<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Eq for ByAddress<T> {}

impl<T: ?Sized> Hash for ByAddress<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as *const () as usize).hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for ByAddress<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByAddress({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// A thread-safe bounded memo cache with LRU eviction.
///
/// Computation runs outside the lock. Two callers missing on the same key at
/// once may both compute; the first result stored is the one every caller
/// gets back, so identity of cached values is stable.
pub struct MemoCache<K, V> {
    name: &'static str,
    entries: Mutex<LruCache<K, V>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create a new cache holding at most `capacity` results.
    pub fn new(name: &'static str, capacity: NonZeroUsize) -> Self {
        Self {
            name,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Get a cached value, marking it most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.lock().get(key).cloned()
    }

    /// Return the cached value for `key` or compute and store it.
    ///
    /// Errors are returned to the caller and never cached.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(hit) = self.get(&key) {
            tracing::trace!(cache = self.name, "cache hit");
            return Ok(hit);
        }

        tracing::debug!(cache = self.name, "cache miss");
        let value = compute()?;

        let mut entries = self.entries.lock();
        if let Some(raced) = entries.get(&key) {
            return Ok(raced.clone());
        }
        if let Some((_, _evicted)) = entries.push(key, value.clone()) {
            tracing::trace!(cache = self.name, "evicted least recently used entry");
        }
        Ok(value)
    }

    /// Check if a key is cached without touching its recency.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.lock().contains(key)
    }

    /// Get the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
