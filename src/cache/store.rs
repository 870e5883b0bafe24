//! Entity store: the keyed cache shared by every query and mutation.
//!
//! All operations are synchronous and infallible. The state lives behind one
//! mutex that is never held across an `.await`, so writes to an entry are
//! serialized and the sequence check in `complete_fetch` cannot race with a
//! newer `begin_fetch`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use metrics::{counter, gauge};
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, trace};

use super::config::QueryConfig;
use super::entry::{CacheEntry, EntryPatch, FetchOutcome, FetchStatus, QueryError};
use super::invalidation::InvalidationScope;
use super::keys::CacheKey;
use super::lock::lock;

const SOURCE: &str = "cache::store";
const METRIC_CACHE_ENTRIES: &str = "loumo_cache_entries";
const METRIC_CACHE_EVICT_TOTAL: &str = "loumo_cache_evict_total";

type EvictionHook = Arc<dyn Fn(&CacheKey) + Send + Sync>;

struct Slot {
    entry: CacheEntry,
    /// Latest fetch sequence issued for this key.
    sequence: u64,
    sender: watch::Sender<CacheEntry>,
}

impl Slot {
    fn new(key: CacheKey) -> Self {
        let entry = CacheEntry::empty(key);
        let (sender, _) = watch::channel(entry.clone());
        Self {
            entry,
            sequence: 0,
            sender,
        }
    }

    fn publish(&self) {
        self.sender.send_replace(self.entry.clone());
    }
}

struct StoreState {
    entries: HashMap<CacheKey, Slot>,
    /// Entries without subscribers, least recently released first out.
    idle: LruCache<CacheKey, ()>,
}

impl StoreState {
    /// Returns the slot for `key`, creating it when absent.
    ///
    /// A slot created with `idle` set joins the idle list; the second element
    /// is a key evicted to make room, if any.
    fn ensure(&mut self, key: &CacheKey, idle: bool) -> (&mut Slot, Option<CacheKey>) {
        let mut evicted = None;
        if !self.entries.contains_key(key) {
            if idle {
                evicted = self.mark_idle(key);
            }
            gauge!(METRIC_CACHE_ENTRIES).set((self.entries.len() + 1) as f64);
        }
        let slot = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Slot::new(key.clone()));
        (slot, evicted)
    }

    fn mark_idle(&mut self, key: &CacheKey) -> Option<CacheKey> {
        let (evicted, _) = self.idle.push(key.clone(), ())?;
        if &evicted == key {
            return None;
        }
        self.entries.remove(&evicted);
        counter!(METRIC_CACHE_EVICT_TOTAL).increment(1);
        gauge!(METRIC_CACHE_ENTRIES).set(self.entries.len() as f64);
        Some(evicted)
    }
}

struct StoreInner {
    state: Mutex<StoreState>,
    eviction_hook: Mutex<Option<EvictionHook>>,
}

/// Process-wide keyed store of fetched collections.
///
/// Cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct EntityStore {
    inner: Arc<StoreInner>,
}

impl EntityStore {
    pub fn new(config: &QueryConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(StoreState {
                    entries: HashMap::new(),
                    idle: LruCache::new(config.max_idle_entries_non_zero()),
                }),
                eviction_hook: Mutex::new(None),
            }),
        }
    }

    /// Install a callback invoked (outside the store lock) for every evicted key.
    pub fn set_eviction_hook(&self, hook: impl Fn(&CacheKey) + Send + Sync + 'static) {
        *lock(&self.inner.eviction_hook, SOURCE, "set_eviction_hook") = Some(Arc::new(hook));
    }

    fn state(&self, op: &'static str) -> std::sync::MutexGuard<'_, StoreState> {
        lock(&self.inner.state, SOURCE, op)
    }

    fn notify_evicted(&self, evicted: Option<CacheKey>) {
        let Some(key) = evicted else {
            return;
        };
        debug!(key = %key, "Evicted idle cache entry");
        let hook = lock(&self.inner.eviction_hook, SOURCE, "notify_evicted").clone();
        if let Some(hook) = hook {
            hook(&key);
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.state("get")
            .entries
            .get(key)
            .map(|slot| slot.entry.clone())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.state("contains").entries.contains_key(key)
    }

    pub fn subscriber_count(&self, key: &CacheKey) -> usize {
        self.state("subscriber_count")
            .entries
            .get(key)
            .map_or(0, |slot| slot.entry.subscriber_count)
    }

    /// Latest sequence number issued for `key` (0 when never fetched).
    pub fn latest_sequence(&self, key: &CacheKey) -> u64 {
        self.state("latest_sequence")
            .entries
            .get(key)
            .map_or(0, |slot| slot.sequence)
    }

    /// All keys currently cached, in sorted order.
    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<_> = self.state("keys").entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Keys with at least one subscriber, in sorted order.
    pub fn active_keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<_> = self
            .state("active_keys")
            .entries
            .values()
            .filter(|slot| slot.entry.subscriber_count > 0)
            .map(|slot| slot.entry.key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.state("len").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Merge `patch` into the entry for `key`, creating it if absent.
    pub fn upsert(&self, key: &CacheKey, patch: EntryPatch) {
        let evicted = {
            let mut state = self.state("upsert");
            let (slot, evicted) = state.ensure(key, true);
            patch.apply(&mut slot.entry);
            slot.publish();
            evicted
        };
        self.notify_evicted(evicted);
    }

    /// Register a subscriber for `key`; dropping the returned guard unsubscribes.
    pub fn subscribe(&self, key: &CacheKey) -> Subscription {
        let (receiver, evicted) = {
            let mut state = self.state("subscribe");
            let (slot, evicted) = state.ensure(key, false);
            slot.entry.subscriber_count += 1;
            slot.publish();
            let receiver = slot.sender.subscribe();
            state.idle.pop(key);
            (receiver, evicted)
        };
        self.notify_evicted(evicted);
        trace!(key = %key, "Subscribed to cache entry");

        Subscription {
            key: key.clone(),
            store: self.clone(),
            receiver,
        }
    }

    fn release(&self, key: &CacheKey) {
        let evicted = {
            let mut state = self.state("release");
            let Some(slot) = state.entries.get_mut(key) else {
                return;
            };
            slot.entry.subscriber_count = slot.entry.subscriber_count.saturating_sub(1);
            if slot.entry.subscriber_count > 0 {
                slot.publish();
                return;
            }
            if slot.entry.status == FetchStatus::Loading {
                // Abandon the in-flight fetch: its result no longer matches the sequence.
                slot.sequence += 1;
                slot.entry.status = FetchStatus::Stale;
            }
            slot.publish();
            state.mark_idle(key)
        };
        trace!(key = %key, "Unsubscribed from cache entry");
        self.notify_evicted(evicted);
    }

    /// Mark every entry under `prefixes` stale.
    ///
    /// Returns the keys that must be refetched now: entries with subscribers for
    /// [`InvalidationScope::Active`], every matching entry for
    /// [`InvalidationScope::All`]. Entries that are already stale keep their
    /// state and are returned again when the scope requires a refetch.
    pub fn invalidate(&self, prefixes: &[CacheKey], scope: InvalidationScope) -> Vec<CacheKey> {
        let mut state = self.state("invalidate");
        let mut refetch = Vec::new();

        for slot in state.entries.values_mut() {
            if !prefixes
                .iter()
                .any(|prefix| slot.entry.key.starts_with(prefix))
            {
                continue;
            }
            if slot.entry.status != FetchStatus::Stale {
                slot.entry.status = FetchStatus::Stale;
                slot.publish();
            }

            let eager = match scope {
                InvalidationScope::Active => slot.entry.subscriber_count > 0,
                InvalidationScope::All => true,
            };
            if eager {
                refetch.push(slot.entry.key.clone());
            }
        }

        refetch.sort();
        refetch
    }

    /// Issue a new fetch sequence number for `key` and mark it loading.
    ///
    /// Returns `None` when the entry does not exist.
    pub fn begin_fetch(&self, key: &CacheKey) -> Option<u64> {
        let mut state = self.state("begin_fetch");
        let slot = state.entries.get_mut(key)?;
        slot.sequence += 1;
        slot.entry.status = FetchStatus::Loading;
        slot.publish();
        Some(slot.sequence)
    }

    /// True while `sequence` is the latest fetch issued for `key`.
    pub fn is_current(&self, key: &CacheKey, sequence: u64) -> bool {
        self.state("is_current")
            .entries
            .get(key)
            .is_some_and(|slot| slot.sequence == sequence)
    }

    /// Apply the result of fetch `sequence` unless a newer fetch superseded it.
    pub fn complete_fetch(
        &self,
        key: &CacheKey,
        sequence: u64,
        result: Result<Value, QueryError>,
        at: OffsetDateTime,
    ) -> FetchOutcome {
        let mut state = self.state("complete_fetch");
        let Some(slot) = state.entries.get_mut(key) else {
            return FetchOutcome::Superseded;
        };
        if slot.sequence != sequence {
            return FetchOutcome::Superseded;
        }

        let outcome = match result {
            Ok(data) => {
                EntryPatch::success(data, at).apply(&mut slot.entry);
                FetchOutcome::Applied
            }
            Err(error) => {
                EntryPatch::new()
                    .status(FetchStatus::Error)
                    .error(error)
                    .apply(&mut slot.entry);
                FetchOutcome::Failed
            }
        };
        slot.publish();
        outcome
    }

    /// Drop every entry. Live subscriptions keep their last snapshot.
    pub fn clear(&self) {
        let mut state = self.state("clear");
        state.entries.clear();
        state.idle.clear();
        gauge!(METRIC_CACHE_ENTRIES).set(0.0);
    }
}

/// Live subscription to one cache entry.
///
/// Counts towards the entry's `subscriber_count` until dropped.
pub struct Subscription {
    key: CacheKey,
    store: EntityStore,
    receiver: watch::Receiver<CacheEntry>,
}

impl Subscription {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Latest snapshot published for the entry.
    pub fn current(&self) -> CacheEntry {
        self.receiver.borrow().clone()
    }

    /// Wait for the next upsert to the entry.
    ///
    /// Returns false when the entry was dropped from the store.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.store.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::cache_key;

    fn store() -> EntityStore {
        EntityStore::new(&QueryConfig::default())
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    #[test]
    fn get_has_no_side_effects() {
        let store = store();
        assert!(store.get(&cache_key!["orders"]).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn upsert_creates_and_merges() {
        let store = store();
        let key = cache_key!["orders"];

        store.upsert(&key, EntryPatch::new().data(json!([1])));
        store.upsert(&key, EntryPatch::new().status(FetchStatus::Success));

        let entry = store.get(&key).expect("entry");
        assert_eq!(entry.data, Some(json!([1])));
        assert_eq!(entry.status, FetchStatus::Success);
    }

    #[test]
    fn subscribe_counts_and_unsubscribe_releases() {
        let store = store();
        let key = cache_key!["agents"];

        let first = store.subscribe(&key);
        let second = store.subscribe(&key);
        assert_eq!(store.subscriber_count(&key), 2);

        drop(first);
        assert_eq!(store.subscriber_count(&key), 1);
        second.unsubscribe();
        assert_eq!(store.subscriber_count(&key), 0);
        assert!(store.active_keys().is_empty());
    }

    #[tokio::test]
    async fn subscriber_sees_every_upsert() {
        let store = store();
        let key = cache_key!["categories"];
        let mut subscription = store.subscribe(&key);

        store.upsert(&key, EntryPatch::new().data(json!(["fruit"])));
        assert!(subscription.changed().await);
        assert_eq!(subscription.current().data, Some(json!(["fruit"])));
    }

    #[test]
    fn newer_sequence_wins_regardless_of_completion_order() {
        let store = store();
        let key = cache_key!["orders"];
        let _sub = store.subscribe(&key);

        let first = store.begin_fetch(&key).expect("seq a");
        let second = store.begin_fetch(&key).expect("seq b");
        assert!(second > first);

        let outcome = store.complete_fetch(&key, second, Ok(json!("b")), now());
        assert_eq!(outcome, FetchOutcome::Applied);
        let outcome = store.complete_fetch(&key, first, Ok(json!("a")), now());
        assert_eq!(outcome, FetchOutcome::Superseded);

        let entry = store.get(&key).expect("entry");
        assert_eq!(entry.data, Some(json!("b")));
        assert_eq!(entry.status, FetchStatus::Success);
    }

    #[test]
    fn failure_keeps_last_known_data() {
        let store = store();
        let key = cache_key!["products"];
        let _sub = store.subscribe(&key);

        let seq = store.begin_fetch(&key).expect("seq");
        store.complete_fetch(&key, seq, Ok(json!([1, 2])), now());
        let seq = store.begin_fetch(&key).expect("seq");
        let outcome = store.complete_fetch(&key, seq, Err(QueryError::Timeout), now());

        assert_eq!(outcome, FetchOutcome::Failed);
        let entry = store.get(&key).expect("entry");
        assert_eq!(entry.status, FetchStatus::Error);
        assert_eq!(entry.error, Some(QueryError::Timeout));
        assert_eq!(entry.data, Some(json!([1, 2])));
    }

    #[test]
    fn invalidate_marks_family_stale_and_keeps_data() {
        let store = store();
        store.upsert(
            &cache_key!["products"],
            EntryPatch::success(json!([1]), now()),
        );
        store.upsert(
            &cache_key!["products", 1],
            EntryPatch::success(json!({"id": 1}), now()),
        );
        store.upsert(&cache_key!["orders"], EntryPatch::success(json!([]), now()));

        let refetch = store.invalidate(&[cache_key!["products"]], InvalidationScope::Active);
        assert!(refetch.is_empty());

        let products = store.get(&cache_key!["products"]).expect("products");
        assert_eq!(products.status, FetchStatus::Stale);
        assert_eq!(products.data, Some(json!([1])));
        assert!(store.get(&cache_key!["products", 1]).expect("item").is_stale());
        assert_eq!(
            store.get(&cache_key!["orders"]).expect("orders").status,
            FetchStatus::Success
        );
    }

    #[test]
    fn active_scope_only_returns_subscribed_entries() {
        let store = store();
        let _orders = store.subscribe(&cache_key!["orders"]);
        store.upsert(&cache_key!["orders", 7], EntryPatch::new());

        let refetch = store.invalidate(&[cache_key!["orders"]], InvalidationScope::Active);
        assert_eq!(refetch, vec![cache_key!["orders"]]);

        store.upsert(&cache_key!["agents"], EntryPatch::new());
        let refetch = store.invalidate(&[cache_key!["agents"]], InvalidationScope::All);
        assert_eq!(refetch, vec![cache_key!["agents"]]);
    }

    #[test]
    fn invalidating_twice_is_a_no_op() {
        let store = store();
        let key = cache_key!["zones"];
        store.upsert(&key, EntryPatch::success(json!([]), now()));

        store.invalidate(&[key.clone()], InvalidationScope::Active);
        let once = store.get(&key).expect("entry");
        let refetch = store.invalidate(&[key.clone()], InvalidationScope::Active);
        let twice = store.get(&key).expect("entry");

        assert!(refetch.is_empty());
        assert_eq!(once, twice);
    }

    #[test]
    fn all_scope_still_refetches_an_already_stale_entry() {
        let store = store();
        let key = cache_key!["agents"];
        store.upsert(&key, EntryPatch::success(json!([]), now()));

        assert!(store.invalidate(&[key.clone()], InvalidationScope::Active).is_empty());
        let stale = store.get(&key).expect("entry");
        let refetch = store.invalidate(&[key.clone()], InvalidationScope::All);

        assert_eq!(refetch, vec![key.clone()]);
        assert_eq!(store.get(&key).expect("entry"), stale);
    }

    #[test]
    fn last_unsubscribe_abandons_in_flight_fetch() {
        let store = store();
        let key = cache_key!["deliveries"];
        let subscription = store.subscribe(&key);

        let seq = store.begin_fetch(&key).expect("seq");
        drop(subscription);

        assert_eq!(store.get(&key).expect("entry").status, FetchStatus::Stale);
        let outcome = store.complete_fetch(&key, seq, Ok(json!(["late"])), now());
        assert_eq!(outcome, FetchOutcome::Superseded);
        assert_eq!(store.get(&key).expect("entry").data, None);
    }

    #[test]
    fn idle_entries_are_evicted_lru_first() {
        let config = QueryConfig {
            max_idle_entries: 2,
            ..Default::default()
        };
        let store = EntityStore::new(&config);
        let evictions = Arc::new(AtomicUsize::new(0));
        let counter = evictions.clone();
        store.set_eviction_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let _held = store.subscribe(&cache_key!["orders"]);
        store.upsert(&cache_key!["a"], EntryPatch::new());
        store.upsert(&cache_key!["b"], EntryPatch::new());
        store.upsert(&cache_key!["c"], EntryPatch::new());

        assert!(!store.contains(&cache_key!["a"]));
        assert!(store.contains(&cache_key!["b"]));
        assert!(store.contains(&cache_key!["c"]));
        // Subscribed entries never count against the idle limit.
        assert!(store.contains(&cache_key!["orders"]));
        assert_eq!(evictions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscribing_to_a_new_key_evicts_nothing() {
        let config = QueryConfig {
            max_idle_entries: 1,
            ..Default::default()
        };
        let store = EntityStore::new(&config);
        store.upsert(&cache_key!["zones"], EntryPatch::new());

        let _held = store.subscribe(&cache_key!["orders"]);

        assert!(store.contains(&cache_key!["zones"]));
        assert!(store.contains(&cache_key!["orders"]));
    }

    #[test]
    fn complete_fetch_for_missing_entry_is_superseded() {
        let store = store();
        let outcome = store.complete_fetch(&cache_key!["gone"], 1, Ok(json!(1)), now());
        assert_eq!(outcome, FetchOutcome::Superseded);
        assert!(store.begin_fetch(&cache_key!["gone"]).is_none());
    }
}
