use loumo_api_types::{CategoryRequest, ProductRequest, VariantRequest};

use crate::application::admin::Update;
use crate::application::error::AppError;
use crate::cli::{Ctx, print_json};
use crate::config::{CategoriesCmd, CategoryFields, ProductFields, ProductsCmd, VariantFields};
use crate::domain::filters::{ProductFilter, filter_categories};

pub async fn categories(ctx: &Ctx, cmd: CategoriesCmd) -> Result<(), AppError> {
    let service = ctx.admin.categories();
    match cmd {
        CategoriesCmd::List { search } => {
            let categories = ctx.fetch(service.list()).await?;
            print_json(&filter_categories(categories, search.as_deref()))
        }
        CategoriesCmd::Create(fields) => {
            let created = ctx.admin.submit(&service.create(), category_request(fields)).await?;
            print_json(&created)
        }
        CategoriesCmd::Update { id, fields } => {
            let updated = ctx
                .admin
                .submit(&service.update(), Update::new(id, category_request(fields)))
                .await?;
            print_json(&updated)
        }
        CategoriesCmd::Delete { id } => {
            ctx.admin.submit(&service.delete(), id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}

pub async fn products(ctx: &Ctx, cmd: ProductsCmd) -> Result<(), AppError> {
    let service = ctx.admin.products();
    match cmd {
        ProductsCmd::List {
            category_id,
            search,
            published,
        } => {
            let filter = ProductFilter {
                category_id,
                search,
                published,
            };
            let products = ctx.fetch(service.list()).await?;
            print_json(&filter.apply(products))
        }
        ProductsCmd::Show { id } => print_json(&ctx.fetch(service.detail(id)).await?),
        ProductsCmd::Create(fields) => {
            let created = ctx.admin.submit(&service.create(), product_request(fields)).await?;
            print_json(&created)
        }
        ProductsCmd::Update { id, fields } => {
            let updated = ctx
                .admin
                .submit(&service.update(), Update::new(id, product_request(fields)))
                .await?;
            print_json(&updated)
        }
        ProductsCmd::Delete { ids } => {
            let ack = ctx.admin.submit(&service.bulk_delete(), ids).await?;
            print_json(&ack)
        }
        ProductsCmd::AddVariant { product_id, fields } => {
            let variant = ctx
                .admin
                .submit(&service.add_variant(product_id), variant_request(fields))
                .await?;
            print_json(&variant)
        }
        ProductsCmd::UpdateVariant {
            product_id,
            variant_id,
            fields,
        } => {
            let variant = ctx
                .admin
                .submit(
                    &service.update_variant(product_id),
                    Update::new(variant_id, variant_request(fields)),
                )
                .await?;
            print_json(&variant)
        }
        ProductsCmd::DeleteVariant {
            product_id,
            variant_id,
        } => {
            ctx.admin
                .submit(&service.delete_variant(product_id), variant_id)
                .await?;
            print_json(&serde_json::json!({ "deleted": variant_id }))
        }
        ProductsCmd::UploadImage { product_id, file } => {
            let image = ctx
                .admin
                .submit(&service.upload_image(product_id), file)
                .await?;
            print_json(&image)
        }
    }
}

fn category_request(fields: CategoryFields) -> CategoryRequest {
    CategoryRequest {
        name: fields.name,
        description: fields.description,
        parent_id: fields.parent_id,
    }
}

fn product_request(fields: ProductFields) -> ProductRequest {
    ProductRequest {
        name: fields.name,
        description: fields.description,
        category_id: fields.category_id,
        published: fields.published,
    }
}

fn variant_request(fields: VariantFields) -> VariantRequest {
    VariantRequest {
        name: fields.name,
        price: fields.price,
        stock: fields.stock,
        sku: fields.sku,
    }
}
