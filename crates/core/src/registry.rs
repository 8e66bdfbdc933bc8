//! # Component Registry (Flyweight Pool)
//!
//! Interns one canonical shared instance per key. Every caller asking for
//! the same key receives the *same* `Arc`, never a copy.
//!
//! ## Single-flight construction
//!
//! ```text
//!   get_or_create(k, f)
//!     │
//!     ├─ slot(k) initialized? ──yes──▶ return Arc (lock-free)
//!     │
//!     └─ slot(k).get_or_try_init(f)
//!          ├─ another caller won ──▶ wait, return its Arc
//!          └─ run f() ──Ok──▶ store, return
//!                      └─Err─▶ leave slot empty, return error
//! ```
//!
//! Each key has its own [`OnceCell`], so slow construction of one key never
//! blocks callers of another. A failed construction stores nothing: the next
//! caller for that key runs its own factory, and a slot nobody else is
//! waiting on is dropped from the pool.
//!
//! Entries are never evicted; the pool lives as long as the registry.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::Serialize;

use crate::error::EngineError;
use crate::hooks::{EngineHook, NullHook};

/// Registry counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Keys with a constructed instance
    pub entries: usize,
    /// Requests served from the pool
    pub hits: u64,
    /// Requests that found no instance
    pub misses: u64,
    /// Successful factory runs
    pub constructions: u64,
    /// Failed factory runs
    pub failures: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    constructions: AtomicU64,
    failures: AtomicU64,
}

/// A flyweight pool mapping keys to canonical shared instances.
///
/// `C` is usually a `dyn Component<Output = T>`, but any shareable type
/// works; [`crate::EngineContext`] pools `dyn Any` singletons here.
pub struct ComponentRegistry<K, C: ?Sized> {
    /// One cell per key, empty until its first successful construction.
    pool: RwLock<HashMap<K, Arc<OnceCell<Arc<C>>>>>,
    hook: Arc<dyn EngineHook>,
    counters: Counters,
}

impl<K, C> ComponentRegistry<K, C>
where
    K: Eq + Hash + Clone + fmt::Debug,
    C: ?Sized + Send + Sync,
{
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty registry sized for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pool: RwLock::new(HashMap::with_capacity(capacity)),
            hook: Arc::new(NullHook),
            counters: Counters::default(),
        }
    }

    /// Report constructions and hits to `hook`.
    pub fn with_hook(mut self, hook: Arc<dyn EngineHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Return the instance for `key`, running `factory` if there is none.
    ///
    /// Concurrent callers racing on an unseen key trigger exactly one
    /// `factory` call; the others wait and receive the same instance. If the
    /// factory fails, its caller gets the error and nothing is cached.
    pub fn get_or_create<F>(&self, key: K, factory: F) -> Result<Arc<C>, EngineError>
    where
        F: FnOnce() -> Result<Arc<C>, EngineError>,
    {
        let slot = self.slot(&key);
        if let Some(instance) = slot.get() {
            return Ok(self.hit(&key, instance));
        }

        let mut built = false;
        let result = slot.get_or_try_init(|| {
            built = true;
            self.construct(&key, factory)
        });
        match result {
            Ok(instance) if built => Ok(Arc::clone(instance)),
            Ok(instance) => Ok(self.hit(&key, instance)),
            Err(error) => {
                self.discard_if_empty(&key, &slot);
                Err(error)
            }
        }
    }

    /// Like [`get_or_create`](Self::get_or_create) for infallible factories
    /// of sized instances.
    pub fn intern<F>(&self, key: K, factory: F) -> Arc<C>
    where
        C: Sized,
        F: FnOnce() -> C,
    {
        let slot = self.slot(&key);
        if let Some(instance) = slot.get() {
            return self.hit(&key, instance);
        }

        let mut built = false;
        let instance = slot.get_or_init(|| {
            built = true;
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            self.hook.on_construct_start(&key);
            let instance = Arc::new(factory());
            self.counters.constructions.fetch_add(1, Ordering::Relaxed);
            self.hook.on_construct_end(&key, Ok(()));
            instance
        });
        if built {
            Arc::clone(instance)
        } else {
            self.hit(&key, instance)
        }
    }

    /// The instance for `key`, if one has been constructed.
    pub fn get(&self, key: &K) -> Option<Arc<C>> {
        self.pool
            .read()
            .get(key)
            .and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Number of keys with a constructed instance.
    pub fn len(&self) -> usize {
        self.pool
            .read()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys with a constructed instance, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        self.pool
            .read()
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            entries: self.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            constructions: self.counters.constructions.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    /// Find or insert the slot for `key`. The pool lock is held only for the
    /// lookup, never across construction.
    fn slot(&self, key: &K) -> Arc<OnceCell<Arc<C>>> {
        if let Some(slot) = self.pool.read().get(key) {
            return Arc::clone(slot);
        }
        let mut pool = self.pool.write();
        Arc::clone(
            pool.entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    /// Run `factory` as the single builder for `key`, reporting the outcome.
    fn construct<F>(&self, key: &K, factory: F) -> Result<Arc<C>, EngineError>
    where
        F: FnOnce() -> Result<Arc<C>, EngineError>,
    {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        self.hook.on_construct_start(key);
        match factory() {
            Ok(instance) => {
                self.counters.constructions.fetch_add(1, Ordering::Relaxed);
                self.hook.on_construct_end(key, Ok(()));
                Ok(instance)
            }
            Err(error) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                self.hook.on_construct_end(key, Err(&error));
                Err(error)
            }
        }
    }

    /// Drop `slot` from the pool after a failed construction, unless another
    /// caller still holds it and may yet fill it.
    fn discard_if_empty(&self, key: &K, slot: &Arc<OnceCell<Arc<C>>>) {
        let mut pool = self.pool.write();
        let idle = pool.get(key).map_or(false, |current| {
            Arc::ptr_eq(current, slot) && current.get().is_none() && Arc::strong_count(slot) == 2
        });
        if idle {
            pool.remove(key);
        }
    }

    fn hit(&self, key: &K, instance: &Arc<C>) -> Arc<C> {
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        self.hook.on_cache_hit(key);
        Arc::clone(instance)
    }
}

impl<K, C> Default for ComponentRegistry<K, C>
where
    K: Eq + Hash + Clone + fmt::Debug,
    C: ?Sized + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C: ?Sized> fmt::Debug for ComponentRegistry<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("slots", &self.pool.read().len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
