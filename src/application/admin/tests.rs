use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use loumo_api_types::{
    CategoryRequest, DeliveryAssignRequest, PageUpdateRequest, VariantRequest, ZoneRequest,
};
use serde_json::json;
use url::Url;

use super::*;
use crate::application::notify::{MemoryNotifier, NotificationVariant};
use crate::cache::{EntityKind, FetchStatus, MutationStatus, QueryConfig};
use crate::config::BackendSettings;

fn context(server: &MockServer) -> (AdminContext, Arc<MemoryNotifier>) {
    let settings = BackendSettings {
        base_url: Url::parse(&server.url("/api/")).expect("url"),
        api_token: None,
        timeout: Duration::from_secs(5),
    };
    let backend = BackendClient::new(&settings).expect("backend client");
    let notifier = Arc::new(MemoryNotifier::new());
    let ctx = AdminContext::new(
        QueryClient::new(QueryConfig::default()),
        backend,
        notifier.clone(),
    );
    (ctx, notifier)
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn invalid_input_never_reaches_backend() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/categories");
            then.status(201).json_body(json!({"id": 1, "name": "Fruits"}));
        })
        .await;
    let (ctx, notifier) = context(&server);
    let mutation = ctx.categories().create();

    let err = ctx
        .submit(
            &mutation,
            CategoryRequest {
                name: "   ".into(),
                description: None,
                parent_id: None,
            },
        )
        .await
        .expect_err("blank name");

    assert!(err.is_validation());
    assert_eq!(mutation.status(), MutationStatus::Idle);
    assert_eq!(create.hits_async().await, 0);

    let notes = notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Invalid input");
    assert_eq!(notes[0].variant, NotificationVariant::Destructive);
}

#[tokio::test]
async fn backend_message_is_notified_verbatim() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/zones/4");
            then.status(409)
                .json_body(json!({"message": "Zone still has agents"}));
        })
        .await;
    let (ctx, notifier) = context(&server);
    let mutation = ctx.zones().delete();

    let err = ctx.submit(&mutation, 4).await.expect_err("conflict");

    assert_eq!(err.operator_message(), "Zone still has agents");
    assert_eq!(mutation.status(), MutationStatus::Error);
    let notes = notifier.notifications();
    assert_eq!(notes[0].title, "Action failed");
    assert_eq!(notes[0].description.as_deref(), Some("Zone still has agents"));
}

#[tokio::test]
async fn successful_write_notifies_with_mutation_name() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/zones")
                .json_body(json!({"name": "Plateau", "delivery_fee": 500.0, "active": true}));
            then.status(201)
                .json_body(json!({"id": 7, "name": "Plateau", "delivery_fee": 500.0, "active": true}));
        })
        .await;
    let (ctx, notifier) = context(&server);
    let mutation = ctx.zones().create();

    let zone = ctx
        .submit(
            &mutation,
            ZoneRequest {
                name: " Plateau ".into(),
                delivery_fee: 500.0,
                active: true,
            },
        )
        .await
        .expect("zone created");

    create.assert_async().await;
    assert_eq!(zone.id, 7);
    assert_eq!(notifier.notifications()[0].title, "Zone created");
    assert_eq!(
        notifier.notifications()[0].variant,
        NotificationVariant::Success
    );
}

#[tokio::test]
async fn delivery_assignment_refreshes_unmounted_agents() {
    let server = MockServer::start_async().await;
    let agents = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/agents");
            then.status(200).json_body(json!([
                {"id": 3, "full_name": "Ibou", "phone": "770000000", "status": "available"}
            ]));
        })
        .await;
    let deliveries = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/deliveries");
            then.status(200).json_body(json!([]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/deliveries/11/assign")
                .json_body(json!({"agent_id": 3}));
            then.status(200).json_body(json!({
                "id": 11, "order_id": 90, "agent_id": 3, "status": "assigned"
            }));
        })
        .await;
    let (ctx, _notifier) = context(&server);

    // Fetch agents once, then unmount the view.
    let mut view = ctx.client().mount(ctx.agents().list());
    assert!(view.settled().await.is_success());
    drop(view);
    assert_eq!(agents.hits_async().await, 1);

    let mutation = ctx.deliveries().assign();
    ctx.submit(&mutation, Update::new(11, DeliveryAssignRequest { agent_id: 3 }))
        .await
        .expect("assigned");

    let store = ctx.client().store().clone();
    let key = EntityKind::Agents.root();
    wait_until(|| {
        store
            .get(&key)
            .is_some_and(|entry| entry.status == FetchStatus::Success)
    })
    .await;
    assert_eq!(agents.hits_async().await, 2);
    assert_eq!(deliveries.hits_async().await, 0);
}

#[tokio::test]
async fn variant_change_marks_product_family_stale() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/products/5/variants");
            then.status(201)
                .json_body(json!({"id": 50, "name": "1 kg", "price": 1200.0, "stock": 8}));
        })
        .await;
    let (ctx, _notifier) = context(&server);
    let store = ctx.client().store().clone();
    let detail = EntityKind::Products.item(5);
    let list = EntityKind::Products.root();
    let data = crate::cache::EntryPatch::success(json!({"id": 5}), time::OffsetDateTime::UNIX_EPOCH);
    store.upsert(&detail, data.clone());
    store.upsert(&list, data);

    let mutation = ctx.products().add_variant(5);
    ctx.submit(
        &mutation,
        VariantRequest {
            name: "1 kg".into(),
            price: 1200.0,
            stock: 8,
            sku: None,
        },
    )
    .await
    .expect("variant added");

    assert_eq!(store.get(&detail).expect("detail").status, FetchStatus::Stale);
    assert_eq!(store.get(&list).expect("list").status, FetchStatus::Stale);
}

#[test]
fn update_validates_id_and_body() {
    let mut update = Update::new(
        0,
        ZoneRequest {
            name: "Medina".into(),
            delivery_fee: 0.0,
            active: true,
        },
    );
    assert_eq!(update.validate().expect_err("zero id").field(), "id");

    update.id = 2;
    update.body.delivery_fee = -5.0;
    assert_eq!(
        update.validate().expect_err("negative fee").field(),
        "delivery_fee"
    );
}

#[test]
fn page_edit_requires_single_segment_slug() {
    let mut edit = PageEdit {
        slug: "legal/terms".into(),
        body: PageUpdateRequest {
            title: "Terms".into(),
            body: "Be nice.".into(),
            published: true,
        },
    };
    assert_eq!(edit.validate().expect_err("nested slug").field(), "slug");

    edit.slug = " terms ".into();
    edit.validate().expect("valid edit");
    assert_eq!(edit.slug, "terms");
}

#[test]
fn humanize_mutation_names() {
    assert_eq!(humanize("products_deleted"), "Products deleted");
    assert_eq!(humanize("settings_updated"), "Settings updated");
    assert_eq!(humanize(""), "");
}
