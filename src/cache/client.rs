//! Query client.
//!
//! Owns the entity store, the fetcher registry and the event journal, and
//! drives every fetch: mounting, invalidation refetches, retries and window
//! focus. Fetches run as tokio tasks; all cache writes go through the store.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use super::config::{QueryConfig, RefetchPolicy};
use super::entry::{FetchOutcome, QueryError};
use super::events::{EventKind, EventLog};
use super::invalidation::Invalidation;
use super::keys::CacheKey;
use super::query::{QueryHandle, QueryOptions};
use super::registry::{FetcherRegistry, Registration};
use super::store::EntityStore;

const METRIC_FETCH_TOTAL: &str = "loumo_query_fetch_total";
const METRIC_FETCH_MS: &str = "loumo_query_fetch_ms";
const METRIC_SUPERSEDED_TOTAL: &str = "loumo_query_superseded_total";
const METRIC_INVALIDATED_TOTAL: &str = "loumo_cache_invalidated_total";

struct ClientInner {
    config: QueryConfig,
    store: EntityStore,
    registry: FetcherRegistry,
    events: EventLog,
}

/// Injectable handle to one query cache.
///
/// Cheap to clone. Each client has its own store; nothing is global.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<ClientInner>,
}

impl QueryClient {
    pub fn new(config: QueryConfig) -> Self {
        let inner = Arc::new(ClientInner {
            store: EntityStore::new(&config),
            registry: FetcherRegistry::new(),
            events: EventLog::new(config.event_log_limit_non_zero()),
            config,
        });

        let weak: Weak<ClientInner> = Arc::downgrade(&inner);
        inner.store.set_eviction_hook(move |key| {
            if let Some(inner) = weak.upgrade() {
                inner.registry.unregister(key);
                inner
                    .events
                    .publish(EventKind::Evicted { key: key.clone() });
            }
        });

        Self { inner }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.inner.store
    }

    pub fn events(&self) -> &EventLog {
        &self.inner.events
    }

    pub fn registry(&self) -> &FetcherRegistry {
        &self.inner.registry
    }

    // ========================================================================
    // Mounting
    // ========================================================================

    /// Mount a view on `options.key`.
    ///
    /// Registers the fetcher, subscribes, and starts a fetch unless the entry
    /// already holds fresh data or one is in flight.
    #[instrument(skip_all, fields(key = %options.key))]
    pub fn mount<T>(&self, options: QueryOptions<T>) -> QueryHandle<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let QueryOptions {
            key,
            fetcher,
            policy,
            ..
        } = options;
        let policy = policy.unwrap_or_else(|| self.inner.config.default_policy());

        self.inner.registry.register(key.clone(), fetcher, policy);
        let subscription = self.inner.store.subscribe(&key);

        let needs_fetch = subscription.current().status.needs_fetch();
        if needs_fetch {
            self.start_fetch(key.clone(), 0);
        }

        let interval = policy
            .interval
            .and_then(|period| self.spawn_interval(key.clone(), period));

        debug!(needs_fetch, "Mounted query");
        QueryHandle::new(self.clone(), subscription, interval)
    }

    fn spawn_interval(&self, key: CacheKey, period: Duration) -> Option<tokio::task::JoinHandle<()>> {
        let handle = runtime_handle(&key, "spawn_interval")?;
        let client = self.clone();
        Some(handle.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!(key = %key, "Interval refetch");
                client.refetch(&key);
            }
        }))
    }

    /// Start a fetch for `key` using its registered fetcher.
    ///
    /// Returns false when no fetcher is registered or no runtime is available.
    pub fn refetch(&self, key: &CacheKey) -> bool {
        self.start_fetch(key.clone(), 0)
    }

    /// Refetch every active entry whose policy opts into window focus.
    pub fn window_focused(&self) -> Vec<CacheKey> {
        let keys = self
            .inner
            .registry
            .focus_keys(&self.inner.store.active_keys());
        for key in &keys {
            self.start_fetch(key.clone(), 0);
        }
        info!(refetched = keys.len(), "Window focus refetch");
        keys
    }

    // ========================================================================
    // Invalidation
    // ========================================================================

    /// Mark the requested families stale and start the refetches they require.
    ///
    /// Returns the keys for which a fetch was started.
    #[instrument(skip_all, fields(scope = %invalidation.scope))]
    pub fn invalidate(&self, invalidation: &Invalidation) -> Vec<CacheKey> {
        let candidates = self
            .inner
            .store
            .invalidate(&invalidation.prefixes, invalidation.scope);

        let refetched: Vec<CacheKey> = candidates
            .into_iter()
            .filter(|key| self.inner.registry.contains(key))
            .filter(|key| self.start_fetch(key.clone(), 0))
            .collect();

        counter!(METRIC_INVALIDATED_TOTAL, "scope" => invalidation.scope.as_str()).increment(1);
        info!(
            prefixes = ?invalidation.prefixes.iter().map(ToString::to_string).collect::<Vec<_>>(),
            refetched = refetched.len(),
            "Cache invalidated"
        );
        self.inner.events.publish(EventKind::Invalidated {
            prefixes: invalidation.prefixes.clone(),
            scope: invalidation.scope,
            refetched: refetched.clone(),
        });
        refetched
    }

    /// Apply invalidations in order.
    pub fn invalidate_all(&self, invalidations: &[Invalidation]) -> Vec<CacheKey> {
        invalidations
            .iter()
            .flat_map(|invalidation| self.invalidate(invalidation))
            .collect()
    }

    pub(crate) fn record_mutation(&self, name: &str, error: Option<&QueryError>) {
        let kind = match error {
            None => EventKind::MutationSucceeded {
                name: name.to_string(),
            },
            Some(error) => EventKind::MutationFailed {
                name: name.to_string(),
                error: error.to_string(),
            },
        };
        self.inner.events.publish(kind);
    }

    // ========================================================================
    // Fetch lifecycle
    // ========================================================================

    fn start_fetch(&self, key: CacheKey, attempt: u32) -> bool {
        let Some(registration) = self.inner.registry.get(&key) else {
            debug!(key = %key, "No fetcher registered; entry left stale");
            return false;
        };
        let Some(handle) = runtime_handle(&key, "start_fetch") else {
            return false;
        };
        let Some(sequence) = self.inner.store.begin_fetch(&key) else {
            return false;
        };

        debug!(key = %key, sequence, attempt, "Fetch started");
        self.inner.events.publish(EventKind::FetchStarted {
            key: key.clone(),
            sequence,
        });

        let client = self.clone();
        handle.spawn(async move {
            let started = Instant::now();
            let result = registration.fetcher.fetch().await;
            client.finish_fetch(key, sequence, attempt, &registration, result, started);
        });
        true
    }

    fn finish_fetch(
        &self,
        key: CacheKey,
        sequence: u64,
        attempt: u32,
        registration: &Registration,
        result: Result<Value, QueryError>,
        started: Instant,
    ) {
        let error = result.as_ref().err().cloned();
        let outcome =
            self.inner
                .store
                .complete_fetch(&key, sequence, result, OffsetDateTime::now_utc());

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_FETCH_MS).record(elapsed_ms);
        counter!(METRIC_FETCH_TOTAL, "outcome" => outcome.as_str()).increment(1);

        match (outcome, error) {
            (FetchOutcome::Applied, _) => {
                info!(key = %key, sequence, elapsed_ms, "Fetch applied");
                self.inner
                    .events
                    .publish(EventKind::FetchApplied { key, sequence });
            }
            (FetchOutcome::Superseded, _) => {
                counter!(METRIC_SUPERSEDED_TOTAL).increment(1);
                debug!(key = %key, sequence, "Fetch result superseded");
                self.inner
                    .events
                    .publish(EventKind::FetchSuperseded { key, sequence });
            }
            (FetchOutcome::Failed, error) => {
                let error = error.map(|error| error.to_string()).unwrap_or_default();
                warn!(key = %key, sequence, attempt, error = %error, "Fetch failed");
                self.inner.events.publish(EventKind::FetchFailed {
                    key: key.clone(),
                    sequence,
                    error,
                });
                if attempt < registration.policy.retry_count {
                    self.schedule_retry(key, sequence, attempt + 1, registration.policy);
                }
            }
        }
    }

    fn schedule_retry(&self, key: CacheKey, failed_sequence: u64, attempt: u32, policy: RefetchPolicy) {
        let Some(handle) = runtime_handle(&key, "schedule_retry") else {
            return;
        };

        debug!(key = %key, attempt, delay_ms = policy.retry_delay.as_millis() as u64, "Retry scheduled");
        self.inner.events.publish(EventKind::RetryScheduled {
            key: key.clone(),
            attempt,
        });

        let client = self.clone();
        handle.spawn(async move {
            tokio::time::sleep(policy.retry_delay).await;

            let store = &client.inner.store;
            if store.subscriber_count(&key) == 0 {
                debug!(key = %key, "Retry skipped: no subscribers");
                return;
            }
            if !store.is_current(&key, failed_sequence) {
                debug!(key = %key, "Retry skipped: newer fetch issued");
                return;
            }
            client.start_fetch(key, attempt);
        });
    }
}

fn runtime_handle(key: &CacheKey, op: &'static str) -> Option<Handle> {
    match Handle::try_current() {
        Ok(handle) => Some(handle),
        Err(_) => {
            warn!(key = %key, op, "No tokio runtime; fetch not started");
            None
        }
    }
}
