//! Request-scoped query result cache.
//!
//! [`CacheStore`] is a plain value that can be held explicitly. The free
//! functions in this module operate on the store of the current execution
//! context, a task-local slot installed by [`scope`]. Outside a scope they are
//! no-ops and report the cache as disabled.
//!
//! A disabled store never holds entries: `disable` clears before returning.
//! Every clear bumps the store's generation, so a result fetched before a
//! write can be dropped instead of stored with [`store_if`].

use crate::domain::criteria::Fingerprint;
use crate::domain::document::Document;
use crate::domain::warnings::{warn_once, Warning};
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Cached result set for one fingerprint
pub type CacheEntry = Arc<Vec<Document>>;

#[derive(Debug, Default)]
pub struct CacheStore {
    enabled: bool,
    generation: u64,
    entries: HashMap<Fingerprint, CacheEntry>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        self.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn fetch(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        self.entries.get(fingerprint).cloned()
    }

    /// Insert or replace. Ignored while disabled.
    pub fn store(&mut self, fingerprint: Fingerprint, entry: CacheEntry) {
        if self.enabled {
            self.entries.insert(fingerprint, entry);
        }
    }

    /// Insert only if nothing was cleared since `generation` was read
    pub fn store_if(&mut self, generation: u64, fingerprint: Fingerprint, entry: CacheEntry) -> bool {
        if self.generation != generation {
            return false;
        }
        self.store(fingerprint, entry);
        self.enabled
    }

    /// Drop all entries but stay enabled
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Bumped by every `clear` and `disable`
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

tokio::task_local! {
    static QUERY_CACHE: RefCell<CacheStore>;
}

/// Run `fut` inside a fresh execution context with its own (disabled) store
pub async fn scope<F: Future>(fut: F) -> F::Output {
    QUERY_CACHE.scope(RefCell::new(CacheStore::new()), fut).await
}

fn with_store<R>(f: impl FnOnce(&mut CacheStore) -> R) -> Option<R> {
    QUERY_CACHE.try_with(|cell| f(&mut cell.borrow_mut())).ok()
}

/// Whether the caller runs inside a cache scope
pub fn in_context() -> bool {
    QUERY_CACHE.try_with(|_| ()).is_ok()
}

pub fn enable() {
    if with_store(CacheStore::enable).is_none() {
        warn_once(Warning::CacheOutsideContext);
    }
}

pub fn disable() {
    with_store(CacheStore::disable);
}

pub fn is_enabled() -> bool {
    with_store(|s| s.is_enabled()).unwrap_or(false)
}

pub fn fetch(fingerprint: &Fingerprint) -> Option<CacheEntry> {
    with_store(|s| s.fetch(fingerprint)).flatten()
}

pub fn store(fingerprint: Fingerprint, entry: CacheEntry) {
    with_store(|s| s.store(fingerprint, entry));
}

pub fn store_if(generation: u64, fingerprint: Fingerprint, entry: CacheEntry) -> bool {
    with_store(|s| s.store_if(generation, fingerprint, entry)).unwrap_or(false)
}

pub fn generation() -> u64 {
    with_store(|s| s.generation()).unwrap_or(0)
}

pub fn clear() {
    with_store(CacheStore::clear);
}

pub fn len() -> usize {
    with_store(|s| s.len()).unwrap_or(0)
}

/// Enables the context's store on creation. On drop the store goes back to
/// disabled (and empty) unless it was already enabled when the guard was
/// made, so the store is torn down on return, error, panic and cancellation
/// alike while nested guards leave an outer request's cache alone.
#[must_use = "the cache is restored as soon as the guard is dropped"]
pub struct CacheGuard {
    was_enabled: bool,
}

impl CacheGuard {
    pub fn enable() -> Self {
        let was_enabled = is_enabled();
        enable();
        Self { was_enabled }
    }
}

impl Drop for CacheGuard {
    fn drop(&mut self) {
        if !self.was_enabled {
            disable();
        }
    }
}

struct RestoreGuard {
    was_enabled: bool,
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        if self.was_enabled {
            enable();
        }
    }
}

/// Run `fut` with caching turned off. Entries cached before the call are
/// discarded; caching resumes afterwards if it was on.
pub async fn uncached<F: Future>(fut: F) -> F::Output {
    let _restore = RestoreGuard {
        was_enabled: is_enabled(),
    };
    disable();
    fut.await
}
