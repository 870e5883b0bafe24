//! Back-office services: one per resource family.
//!
//! Services hand out [`QueryOptions`] for the collections they read and
//! [`Mutation`]s for the writes they perform. Every mutation is bound to its
//! [`MutationKind`], so the collections it affects are declared in one table.
//! [`AdminContext::submit`] validates the input, runs the write and reports
//! the outcome through the notifier.

use std::sync::Arc;

use loumo_api_types::Id;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::application::error::AppError;
use crate::application::notify::{Notification, Notifier};
use crate::cache::{CacheKey, Mutation, QueryClient, QueryError, QueryOptions};
use crate::domain::error::DomainError;
use crate::domain::validation::Validate;
use crate::infra::http::{ApiError, ApiResponse, BackendClient};

mod agents;
mod categories;
mod clients;
mod content;
mod deliveries;
mod orders;
mod products;
mod zones;

pub use agents::AgentService;
pub use categories::CategoryService;
pub use clients::ClientService;
pub use content::{ContentService, PageEdit};
pub use deliveries::DeliveryService;
pub use orders::OrderService;
pub use products::ProductService;
pub use zones::ZoneService;

/// Shared collaborators of the admin services.
#[derive(Clone)]
pub struct AdminContext {
    client: QueryClient,
    backend: BackendClient,
    notifier: Arc<dyn Notifier>,
}

impl AdminContext {
    pub fn new(client: QueryClient, backend: BackendClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            backend,
            notifier,
        }
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn categories(&self) -> CategoryService {
        CategoryService::new(self)
    }

    pub fn products(&self) -> ProductService {
        ProductService::new(self)
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self)
    }

    pub fn deliveries(&self) -> DeliveryService {
        DeliveryService::new(self)
    }

    pub fn agents(&self) -> AgentService {
        AgentService::new(self)
    }

    pub fn zones(&self) -> ZoneService {
        ZoneService::new(self)
    }

    pub fn clients(&self) -> ClientService {
        ClientService::new(self)
    }

    pub fn content(&self) -> ContentService {
        ContentService::new(self)
    }

    /// Validate `input`, execute `mutation` and notify the operator.
    ///
    /// Invalid input is rejected before the write runs, so neither the
    /// backend nor the cache sees it.
    pub async fn submit<I, R>(&self, mutation: &Mutation<I, R>, mut input: I) -> Result<R, AppError>
    where
        I: Validate + Send + 'static,
        R: Send + 'static,
    {
        if let Err(err) = input.validate() {
            self.report_invalid(&err);
            return Err(err.into());
        }

        match mutation.execute(input).await {
            Ok(result) => {
                self.notifier
                    .notify(Notification::success(humanize(mutation.name())));
                Ok(result)
            }
            Err(err) => {
                let err = AppError::from(err);
                self.notifier.notify(
                    Notification::error("Action failed").description(err.operator_message()),
                );
                Err(err)
            }
        }
    }

    fn report_invalid(&self, err: &DomainError) {
        debug!(error = %err, "Rejected invalid input");
        self.notifier
            .notify(Notification::error("Invalid input").description(err.to_string()));
    }
}

/// Input of writes addressed to one existing record.
#[derive(Debug, Clone, PartialEq)]
pub struct Update<T> {
    pub id: Id,
    pub body: T,
}

impl<T> Update<T> {
    pub fn new(id: Id, body: T) -> Self {
        Self { id, body }
    }
}

impl<T: Validate> Validate for Update<T> {
    fn validate(&mut self) -> Result<(), DomainError> {
        self.id.validate()?;
        self.body.validate()
    }
}

// ============================================================================
// Request plumbing shared by the services
// ============================================================================

fn collection<T>(backend: &BackendClient, key: CacheKey, path: impl Into<String>) -> QueryOptions<T>
where
    T: DeserializeOwned + Serialize + Send + 'static,
{
    let backend = backend.clone();
    let path = path.into();
    QueryOptions::new(key, move || {
        let backend = backend.clone();
        let path = path.clone();
        async move { data(backend.get::<T>(&path, &[]).await) }
    })
}

fn data<T>(result: Result<ApiResponse<T>, ApiError>) -> Result<T, QueryError> {
    result
        .map(|response| response.data)
        .map_err(QueryError::from)
}

fn discard(result: Result<ApiResponse<Option<Value>>, ApiError>) -> Result<(), QueryError> {
    data(result).map(|_| ())
}

/// `"products_deleted"` -> `"Products deleted"`.
fn humanize(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests;
