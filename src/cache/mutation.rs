//! Mutation operations.
//!
//! A mutation runs one write call and, only if it succeeds, applies its
//! declared invalidations in order before the success callback runs.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use metrics::counter;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use super::client::QueryClient;
use super::entry::QueryError;
use super::invalidation::{Invalidation, MutationKind};

const METRIC_MUTATION_TOTAL: &str = "loumo_mutation_total";

type WriteFn<I, R> = dyn Fn(I) -> BoxFuture<'static, Result<R, QueryError>> + Send + Sync;
type SuccessFn<R> = dyn Fn(&R) + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

impl MutationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Observable state of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MutationState {
    pub status: MutationStatus,
    pub error: Option<QueryError>,
}

impl MutationState {
    fn with_status(status: MutationStatus) -> Self {
        Self {
            status,
            error: None,
        }
    }

    fn failed(error: QueryError) -> Self {
        Self {
            status: MutationStatus::Error,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// `execute` was called while a previous call was still pending.
    #[error("mutation `{0}` is already pending")]
    Busy(String),
    #[error(transparent)]
    Failed(#[from] QueryError),
}

impl MutationError {
    /// Underlying write failure, if the write ran.
    pub fn query_error(&self) -> Option<&QueryError> {
        match self {
            Self::Busy(_) => None,
            Self::Failed(error) => Some(error),
        }
    }
}

/// A write bound to the invalidations it implies.
pub struct Mutation<I, R> {
    client: QueryClient,
    name: String,
    write: Arc<WriteFn<I, R>>,
    invalidations: Vec<Invalidation>,
    on_success: Option<Arc<SuccessFn<R>>>,
    state: watch::Sender<MutationState>,
}

impl<I, R> Mutation<I, R>
where
    I: Send + 'static,
    R: Send + 'static,
{
    pub fn new<F, Fut>(client: &QueryClient, name: impl Into<String>, write: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, QueryError>> + Send + 'static,
    {
        let (state, _) = watch::channel(MutationState::default());
        Self {
            client: client.clone(),
            name: name.into(),
            write: Arc::new(move |input| write(input).boxed()),
            invalidations: Vec::new(),
            on_success: None,
            state,
        }
    }

    /// Mutation named after `kind` that applies its table invalidations.
    pub fn for_kind<F, Fut>(client: &QueryClient, kind: MutationKind, write: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, QueryError>> + Send + 'static,
    {
        let mut mutation = Self::new(client, kind.name(), write);
        mutation.invalidations = kind.invalidations();
        mutation
    }

    /// Append an invalidation; declarations apply in the order added.
    pub fn invalidates(mut self, invalidation: Invalidation) -> Self {
        self.invalidations.push(invalidation);
        self
    }

    pub fn on_success(mut self, callback: impl Fn(&R) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invalidations(&self) -> &[Invalidation] {
        &self.invalidations
    }

    pub fn state(&self) -> MutationState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> MutationStatus {
        self.state.borrow().status
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.state.subscribe()
    }

    /// Return to `Idle`. Ignored while a call is pending.
    pub fn reset(&self) {
        self.state.send_if_modified(|state| {
            if state.status == MutationStatus::Pending || state.status == MutationStatus::Idle {
                return false;
            }
            *state = MutationState::default();
            true
        });
    }

    /// Run the write.
    ///
    /// On success the declared invalidations are applied (affected entries are
    /// stale or loading when this returns) and then the success callback runs.
    /// On failure the cache is left untouched.
    pub async fn execute(&self, input: I) -> Result<R, MutationError> {
        let mut accepted = false;
        self.state.send_if_modified(|state| {
            if state.status == MutationStatus::Pending {
                return false;
            }
            *state = MutationState::with_status(MutationStatus::Pending);
            accepted = true;
            true
        });
        if !accepted {
            counter!(METRIC_MUTATION_TOTAL, "outcome" => "busy").increment(1);
            return Err(MutationError::Busy(self.name.clone()));
        }

        let mut pending = PendingGuard {
            state: &self.state,
            name: &self.name,
            armed: true,
        };
        let outcome = (self.write)(input).await;
        pending.armed = false;

        match outcome {
            Ok(result) => {
                let refetched = self.client.invalidate_all(&self.invalidations);
                self.state
                    .send_replace(MutationState::with_status(MutationStatus::Success));
                self.client.record_mutation(&self.name, None);
                counter!(METRIC_MUTATION_TOTAL, "outcome" => "success").increment(1);
                info!(
                    mutation = %self.name,
                    refetched = refetched.len(),
                    "Mutation succeeded"
                );

                if let Some(callback) = &self.on_success {
                    callback(&result);
                }
                Ok(result)
            }
            Err(error) => {
                self.state.send_replace(MutationState::failed(error.clone()));
                self.client.record_mutation(&self.name, Some(&error));
                counter!(METRIC_MUTATION_TOTAL, "outcome" => "error").increment(1);
                warn!(mutation = %self.name, error = %error, "Mutation failed");
                Err(MutationError::Failed(error))
            }
        }
    }
}

/// Fails the call if the `execute` future is dropped before the write resolves.
struct PendingGuard<'a> {
    state: &'a watch::Sender<MutationState>,
    name: &'a str,
    armed: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(mutation = %self.name, "Mutation cancelled before the write resolved");
        counter!(METRIC_MUTATION_TOTAL, "outcome" => "cancelled").increment(1);
        self.state
            .send_replace(MutationState::failed(QueryError::transport("cancelled")));
    }
}
