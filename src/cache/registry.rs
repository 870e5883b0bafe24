//! Fetcher registry.
//!
//! Maps each mounted key to the retrieval function and refetch policy that
//! produced it, so an invalidation can refetch an entry without going back
//! through the view that mounted it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use futures::future::BoxFuture;
use serde_json::Value;

use super::config::RefetchPolicy;
use super::entry::QueryError;
use super::keys::CacheKey;
use super::lock::{read, write};

const SOURCE: &str = "cache::registry";

pub type FetchFuture = BoxFuture<'static, Result<Value, QueryError>>;

/// Retrieval function bound to a cache key.
pub trait Fetcher: Send + Sync {
    fn fetch(&self) -> FetchFuture;
}

impl<F> Fetcher for F
where
    F: Fn() -> FetchFuture + Send + Sync,
{
    fn fetch(&self) -> FetchFuture {
        self()
    }
}

#[derive(Clone)]
pub struct Registration {
    pub fetcher: Arc<dyn Fetcher>,
    pub policy: RefetchPolicy,
}

/// Thread-safe key -> fetcher table.
#[derive(Default)]
pub struct FetcherRegistry {
    entries: RwLock<HashMap<CacheKey, Registration>>,
}

impl FetcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the fetcher for `key`.
    pub fn register(&self, key: CacheKey, fetcher: Arc<dyn Fetcher>, policy: RefetchPolicy) {
        write(&self.entries, SOURCE, "register").insert(key, Registration { fetcher, policy });
    }

    pub fn get(&self, key: &CacheKey) -> Option<Registration> {
        read(&self.entries, SOURCE, "get").get(key).cloned()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        read(&self.entries, SOURCE, "contains").contains_key(key)
    }

    pub fn unregister(&self, key: &CacheKey) {
        write(&self.entries, SOURCE, "unregister").remove(key);
    }

    /// Subset of `keys` whose policy opts into refetch on window focus.
    pub fn focus_keys(&self, keys: &[CacheKey]) -> Vec<CacheKey> {
        let entries = read(&self.entries, SOURCE, "focus_keys");
        keys.iter()
            .filter(|key| {
                entries
                    .get(*key)
                    .is_some_and(|registration| registration.policy.on_window_focus)
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        write(&self.entries, SOURCE, "clear").clear();
    }
}
