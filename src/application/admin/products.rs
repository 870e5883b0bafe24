use std::path::PathBuf;

use loumo_api_types::{
    Ack, Id, Product, ProductBulkDeleteRequest, ProductImage, ProductRequest, ProductVariant,
    VariantRequest,
};

use crate::cache::{EntityKind, Mutation, MutationKind, QueryClient, QueryOptions};
use crate::infra::http::BackendClient;

use super::{AdminContext, Update, collection, data, discard};

/// Products with their variants and images.
#[derive(Clone)]
pub struct ProductService {
    client: QueryClient,
    backend: BackendClient,
}

impl ProductService {
    pub fn new(ctx: &AdminContext) -> Self {
        Self {
            client: ctx.client().clone(),
            backend: ctx.backend().clone(),
        }
    }

    pub fn list(&self) -> QueryOptions<Vec<Product>> {
        collection(&self.backend, EntityKind::Products.root(), "products")
    }

    /// Single product, cached under `["products", id]`.
    pub fn detail(&self, id: Id) -> QueryOptions<Product> {
        collection(
            &self.backend,
            EntityKind::Products.item(id),
            format!("products/{id}"),
        )
    }

    pub fn create(&self) -> Mutation<ProductRequest, Product> {
        let backend = self.backend.clone();
        Mutation::for_kind(&self.client, MutationKind::ProductCreated, move |request: ProductRequest| {
            let backend = backend.clone();
            async move { data(backend.post("products", &request).await) }
        })
    }

    pub fn update(&self) -> Mutation<Update<ProductRequest>, Product> {
        let backend = self.backend.clone();
        Mutation::for_kind(
            &self.client,
            MutationKind::ProductUpdated,
            move |update: Update<ProductRequest>| {
                let backend = backend.clone();
                async move {
                    let path = format!("products/{}", update.id);
                    data(backend.put(&path, &update.body).await)
                }
            },
        )
    }

    /// Delete every selected product in a single request.
    pub fn bulk_delete(&self) -> Mutation<Vec<Id>, Ack> {
        let backend = self.backend.clone();
        Mutation::for_kind(&self.client, MutationKind::ProductsDeleted, move |ids: Vec<Id>| {
            let backend = backend.clone();
            async move {
                let request = ProductBulkDeleteRequest { ids };
                data(backend.post("products/bulk-delete", &request).await)
            }
        })
    }

    pub fn add_variant(&self, product_id: Id) -> Mutation<VariantRequest, ProductVariant> {
        let backend = self.backend.clone();
        Mutation::for_kind(
            &self.client,
            MutationKind::VariantChanged { product_id },
            move |request: VariantRequest| {
                let backend = backend.clone();
                async move {
                    let path = format!("products/{product_id}/variants");
                    data(backend.post(&path, &request).await)
                }
            },
        )
    }

    pub fn update_variant(&self, product_id: Id) -> Mutation<Update<VariantRequest>, ProductVariant> {
        let backend = self.backend.clone();
        Mutation::for_kind(
            &self.client,
            MutationKind::VariantChanged { product_id },
            move |update: Update<VariantRequest>| {
                let backend = backend.clone();
                async move {
                    let path = format!("variants/{}", update.id);
                    data(backend.put(&path, &update.body).await)
                }
            },
        )
    }

    pub fn delete_variant(&self, product_id: Id) -> Mutation<Id, ()> {
        let backend = self.backend.clone();
        Mutation::for_kind(
            &self.client,
            MutationKind::VariantChanged { product_id },
            move |variant_id: Id| {
                let backend = backend.clone();
                async move { discard(backend.delete(&format!("variants/{variant_id}")).await) }
            },
        )
    }

    pub fn upload_image(&self, product_id: Id) -> Mutation<PathBuf, ProductImage> {
        let backend = self.backend.clone();
        Mutation::for_kind(
            &self.client,
            MutationKind::ProductImageUploaded { product_id },
            move |file: PathBuf| {
                let backend = backend.clone();
                async move {
                    let path = format!("products/{product_id}/images");
                    data(backend.upload(&path, &file, &[]).await)
                }
            },
        )
    }
}
