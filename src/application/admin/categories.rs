use loumo_api_types::{Category, CategoryRequest, Id};

use crate::cache::{EntityKind, Mutation, MutationKind, QueryClient, QueryOptions};
use crate::infra::http::BackendClient;

use super::{AdminContext, Update, collection, data, discard};

#[derive(Clone)]
pub struct CategoryService {
    client: QueryClient,
    backend: BackendClient,
}

impl CategoryService {
    pub fn new(ctx: &AdminContext) -> Self {
        Self {
            client: ctx.client().clone(),
            backend: ctx.backend().clone(),
        }
    }

    pub fn list(&self) -> QueryOptions<Vec<Category>> {
        collection(&self.backend, EntityKind::Categories.root(), "categories")
    }

    pub fn create(&self) -> Mutation<CategoryRequest, Category> {
        let backend = self.backend.clone();
        Mutation::for_kind(&self.client, MutationKind::CategoryCreated, move |request: CategoryRequest| {
            let backend = backend.clone();
            async move { data(backend.post("categories", &request).await) }
        })
    }

    pub fn update(&self) -> Mutation<Update<CategoryRequest>, Category> {
        let backend = self.backend.clone();
        Mutation::for_kind(
            &self.client,
            MutationKind::CategoryUpdated,
            move |update: Update<CategoryRequest>| {
                let backend = backend.clone();
                async move {
                    let path = format!("categories/{}", update.id);
                    data(backend.put(&path, &update.body).await)
                }
            },
        )
    }

    pub fn delete(&self) -> Mutation<Id, ()> {
        let backend = self.backend.clone();
        Mutation::for_kind(&self.client, MutationKind::CategoryDeleted, move |id: Id| {
            let backend = backend.clone();
            async move { discard(backend.delete(&format!("categories/{id}")).await) }
        })
    }
}
