use loumo_api_types::{Client, ClientUpdateRequest, Id};

use crate::cache::{EntityKind, Mutation, MutationKind, QueryClient, QueryOptions};
use crate::infra::http::BackendClient;

use super::{AdminContext, Update, collection, data, discard};

/// Customer accounts. Clients sign up on the storefront, so there is no create.
#[derive(Clone)]
pub struct ClientService {
    client: QueryClient,
    backend: BackendClient,
}

impl ClientService {
    pub fn new(ctx: &AdminContext) -> Self {
        Self {
            client: ctx.client().clone(),
            backend: ctx.backend().clone(),
        }
    }

    pub fn list(&self) -> QueryOptions<Vec<Client>> {
        collection(&self.backend, EntityKind::Clients.root(), "clients")
    }

    pub fn update(&self) -> Mutation<Update<ClientUpdateRequest>, Client> {
        let backend = self.backend.clone();
        Mutation::for_kind(
            &self.client,
            MutationKind::ClientUpdated,
            move |update: Update<ClientUpdateRequest>| {
                let backend = backend.clone();
                async move {
                    let path = format!("clients/{}", update.id);
                    data(backend.put(&path, &update.body).await)
                }
            },
        )
    }

    pub fn delete(&self) -> Mutation<Id, ()> {
        let backend = self.backend.clone();
        Mutation::for_kind(&self.client, MutationKind::ClientDeleted, move |id: Id| {
            let backend = backend.clone();
            async move { discard(backend.delete(&format!("clients/{id}")).await) }
        })
    }
}
