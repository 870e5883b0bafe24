use loumo_api_types::{Delivery, DeliveryAssignRequest, DeliveryStatusRequest};

use crate::cache::{EntityKind, Mutation, MutationKind, QueryClient, QueryOptions};
use crate::infra::http::BackendClient;

use super::{AdminContext, Update, collection, data};

#[derive(Clone)]
pub struct DeliveryService {
    client: QueryClient,
    backend: BackendClient,
}

impl DeliveryService {
    pub fn new(ctx: &AdminContext) -> Self {
        Self {
            client: ctx.client().clone(),
            backend: ctx.backend().clone(),
        }
    }

    pub fn list(&self) -> QueryOptions<Vec<Delivery>> {
        collection(&self.backend, EntityKind::Deliveries.root(), "deliveries")
    }

    /// Assigning changes the agent's workload, so agents are refreshed even
    /// when no agent view is mounted.
    pub fn assign(&self) -> Mutation<Update<DeliveryAssignRequest>, Delivery> {
        let backend = self.backend.clone();
        Mutation::for_kind(
            &self.client,
            MutationKind::DeliveryAssigned,
            move |update: Update<DeliveryAssignRequest>| {
                let backend = backend.clone();
                async move {
                    let path = format!("deliveries/{}/assign", update.id);
                    data(backend.post(&path, &update.body).await)
                }
            },
        )
    }

    pub fn set_status(&self) -> Mutation<Update<DeliveryStatusRequest>, Delivery> {
        let backend = self.backend.clone();
        Mutation::for_kind(
            &self.client,
            MutationKind::DeliveryStatusUpdated,
            move |update: Update<DeliveryStatusRequest>| {
                let backend = backend.clone();
                async move {
                    let path = format!("deliveries/{}/status", update.id);
                    data(backend.patch(&path, &update.body).await)
                }
            },
        )
    }
}
