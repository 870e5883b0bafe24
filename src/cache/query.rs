//! Typed view handles over cache entries.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

use super::client::QueryClient;
use super::config::RefetchPolicy;
use super::entry::{CacheEntry, FetchStatus, QueryError};
use super::keys::CacheKey;
use super::registry::{FetchFuture, Fetcher};
use super::store::Subscription;

/// What to mount: a key, the function that retrieves it, and how to refetch.
pub struct QueryOptions<T> {
    pub(crate) key: CacheKey,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) policy: Option<RefetchPolicy>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> QueryOptions<T>
where
    T: Serialize + Send + 'static,
{
    pub fn new<F, Fut>(key: CacheKey, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
    {
        let fetcher = move || -> FetchFuture {
            let pending = fetch();
            async move {
                let value = pending.await?;
                serde_json::to_value(value).map_err(QueryError::decode)
            }
            .boxed()
        };

        Self {
            key,
            fetcher: Arc::new(fetcher),
            policy: None,
            _marker: PhantomData,
        }
    }

    /// Override the client's default refetch policy.
    pub fn policy(mut self, policy: RefetchPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

/// Typed snapshot of a mounted entry.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot<T> {
    pub data: Option<T>,
    pub status: FetchStatus,
    pub error: Option<QueryError>,
    pub last_fetched_at: Option<OffsetDateTime>,
}

impl<T> QuerySnapshot<T> {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == FetchStatus::Error
    }

    pub fn is_stale(&self) -> bool {
        self.status == FetchStatus::Stale
    }
}

impl<T: DeserializeOwned> QuerySnapshot<T> {
    fn decode(entry: CacheEntry) -> Self {
        let mut error = entry.error;
        let data = match entry.data {
            Some(value) => match serde_json::from_value(value) {
                Ok(data) => Some(data),
                Err(err) => {
                    error = Some(QueryError::decode(err));
                    None
                }
            },
            None => None,
        };

        Self {
            data,
            status: entry.status,
            error,
            last_fetched_at: entry.last_fetched_at,
        }
    }
}

/// A mounted view.
///
/// Holds a subscription for as long as it lives. Dropping it unsubscribes and
/// stops its interval refetch; an in-flight fetch runs to completion and its
/// result is discarded if nobody else is subscribed.
pub struct QueryHandle<T> {
    client: QueryClient,
    subscription: Subscription,
    interval: Option<JoinHandle<()>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> QueryHandle<T> {
    pub(crate) fn new(
        client: QueryClient,
        subscription: Subscription,
        interval: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            client,
            subscription,
            interval,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &CacheKey {
        self.subscription.key()
    }

    /// Untyped view of the entry.
    pub fn entry(&self) -> CacheEntry {
        self.subscription.current()
    }

    pub fn snapshot(&self) -> QuerySnapshot<T> {
        QuerySnapshot::decode(self.subscription.current())
    }

    /// Wait for the next change to the entry.
    pub async fn changed(&mut self) -> bool {
        self.subscription.changed().await
    }

    /// Wait until no fetch is outstanding and return the resulting snapshot.
    pub async fn settled(&mut self) -> QuerySnapshot<T> {
        loop {
            let entry = self.subscription.current();
            if entry.status.is_settled() {
                return QuerySnapshot::decode(entry);
            }
            if !self.subscription.changed().await {
                return QuerySnapshot::decode(entry);
            }
        }
    }

    pub fn refetch(&self) -> bool {
        self.client.refetch(self.subscription.key())
    }
}

impl<T> Drop for QueryHandle<T> {
    fn drop(&mut self) {
        if let Some(interval) = self.interval.take() {
            interval.abort();
        }
    }
}
