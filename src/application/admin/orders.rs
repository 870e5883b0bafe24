use loumo_api_types::{Ack, Order, OrderBulkStatusRequest, OrderStatusRequest};

use crate::cache::{EntityKind, Mutation, MutationKind, QueryClient, QueryOptions};
use crate::infra::http::BackendClient;

use super::{AdminContext, Update, collection, data};

#[derive(Clone)]
pub struct OrderService {
    client: QueryClient,
    backend: BackendClient,
}

impl OrderService {
    pub fn new(ctx: &AdminContext) -> Self {
        Self {
            client: ctx.client().clone(),
            backend: ctx.backend().clone(),
        }
    }

    pub fn list(&self) -> QueryOptions<Vec<Order>> {
        collection(&self.backend, EntityKind::Orders.root(), "orders")
    }

    pub fn set_status(&self) -> Mutation<Update<OrderStatusRequest>, Order> {
        let backend = self.backend.clone();
        Mutation::for_kind(
            &self.client,
            MutationKind::OrderStatusUpdated,
            move |update: Update<OrderStatusRequest>| {
                let backend = backend.clone();
                async move {
                    let path = format!("orders/{}/status", update.id);
                    data(backend.patch(&path, &update.body).await)
                }
            },
        )
    }

    /// Move every selected order to the same status in one request.
    pub fn bulk_status(&self) -> Mutation<OrderBulkStatusRequest, Ack> {
        let backend = self.backend.clone();
        Mutation::for_kind(
            &self.client,
            MutationKind::OrdersBulkUpdated,
            move |request: OrderBulkStatusRequest| {
                let backend = backend.clone();
                async move { data(backend.patch("orders/bulk-status", &request).await) }
            },
        )
    }
}
