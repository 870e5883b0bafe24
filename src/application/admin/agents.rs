use loumo_api_types::{Agent, AgentRequest, Id};

use crate::cache::{EntityKind, Mutation, MutationKind, QueryClient, QueryOptions};
use crate::infra::http::BackendClient;

use super::{AdminContext, Update, collection, data, discard};

#[derive(Clone)]
pub struct AgentService {
    client: QueryClient,
    backend: BackendClient,
}

impl AgentService {
    pub fn new(ctx: &AdminContext) -> Self {
        Self {
            client: ctx.client().clone(),
            backend: ctx.backend().clone(),
        }
    }

    pub fn list(&self) -> QueryOptions<Vec<Agent>> {
        collection(&self.backend, EntityKind::Agents.root(), "agents")
    }

    pub fn create(&self) -> Mutation<AgentRequest, Agent> {
        let backend = self.backend.clone();
        Mutation::for_kind(&self.client, MutationKind::AgentCreated, move |request: AgentRequest| {
            let backend = backend.clone();
            async move { data(backend.post("agents", &request).await) }
        })
    }

    pub fn update(&self) -> Mutation<Update<AgentRequest>, Agent> {
        let backend = self.backend.clone();
        Mutation::for_kind(
            &self.client,
            MutationKind::AgentUpdated,
            move |update: Update<AgentRequest>| {
                let backend = backend.clone();
                async move {
                    let path = format!("agents/{}", update.id);
                    data(backend.put(&path, &update.body).await)
                }
            },
        )
    }

    pub fn delete(&self) -> Mutation<Id, ()> {
        let backend = self.backend.clone();
        Mutation::for_kind(&self.client, MutationKind::AgentDeleted, move |id: Id| {
            let backend = backend.clone();
            async move { discard(backend.delete(&format!("agents/{id}")).await) }
        })
    }
}
