use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use httpmock::prelude::*;
use loumo_admin::application::admin::AdminContext;
use loumo_admin::application::notify::MemoryNotifier;
use loumo_admin::cache::{
    CacheKey, EntityKind, EntryPatch, EventKind, FetchStatus, Invalidation, Mutation,
    MutationKind, MutationStatus, QueryClient, QueryConfig, QueryError, QueryOptions,
};
use loumo_admin::config::BackendSettings;
use loumo_admin::infra::http::BackendClient;
use loumo_api_types::{Category, CategoryRequest, Product};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tokio::sync::oneshot;
use url::Url;

fn client() -> QueryClient {
    QueryClient::new(QueryConfig {
        retry_count: 0,
        ..QueryConfig::default()
    })
}

fn counting(key: CacheKey, calls: Arc<AtomicUsize>, value: Value) -> QueryOptions<Value> {
    QueryOptions::new(key, move || {
        calls.fetch_add(1, Ordering::SeqCst);
        let value = value.clone();
        async move { Ok::<_, QueryError>(value) }
    })
}

/// Fetcher whose responses are released by the test, one gate per call.
fn gated(key: CacheKey, gates: Vec<oneshot::Receiver<Value>>) -> QueryOptions<Value> {
    let gates = Arc::new(Mutex::new(VecDeque::from(gates)));
    QueryOptions::new(key, move || {
        let gate = gates.lock().expect("gates").pop_front();
        async move {
            match gate {
                Some(gate) => gate
                    .await
                    .map_err(|_| QueryError::transport("gate dropped")),
                None => Err(QueryError::transport("no response queued")),
            }
        }
    })
}

fn seed(client: &QueryClient, key: &CacheKey, data: Value) {
    client
        .store()
        .upsert(key, EntryPatch::success(data, OffsetDateTime::UNIX_EPOCH));
}

#[tokio::test(start_paused = true)]
async fn late_response_never_overwrites_newer_one() {
    let client = client();
    let key = EntityKind::Orders.root();
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();

    let mut view = client.mount(gated(key.clone(), vec![first_rx, second_rx]));
    assert!(view.refetch());

    second_tx.send(json!(["second"])).expect("second gate");
    let snapshot = view.settled().await;
    assert_eq!(snapshot.data, Some(json!(["second"])));

    first_tx.send(json!(["first"])).expect("first gate");
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(view.snapshot().data, Some(json!(["second"])));
    assert_eq!(view.snapshot().status, FetchStatus::Success);
    assert!(client.events().snapshot().iter().any(|event| matches!(
        &event.kind,
        EventKind::FetchSuperseded { sequence: 1, .. }
    )));
}

#[tokio::test(start_paused = true)]
async fn active_invalidation_refetches_only_subscribed_entries() {
    let client = client();
    let key = EntityKind::Orders.root();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut view = client.mount(counting(key.clone(), calls.clone(), json!([])));
    view.settled().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let refetched = client.invalidate(&Invalidation::active([EntityKind::Orders.root()]));
    assert_eq!(refetched, vec![key.clone()]);
    view.settled().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    drop(view);
    let refetched = client.invalidate(&Invalidation::active([EntityKind::Orders.root()]));
    assert!(refetched.is_empty());
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        client.store().get(&key).expect("entry kept").status,
        FetchStatus::Stale
    );
}

#[tokio::test]
async fn invalidating_twice_matches_invalidating_once() {
    let client = client();
    let products = EntityKind::Products.root();
    seed(&client, &products, json!([{"id": 1}]));

    let invalidation = Invalidation::active([EntityKind::Products.root()]);
    client.invalidate(&invalidation);
    let once = client.store().get(&products).expect("entry");
    client.invalidate(&invalidation);
    let twice = client.store().get(&products).expect("entry");

    assert_eq!(once, twice);
    assert_eq!(twice.status, FetchStatus::Stale);
    assert_eq!(twice.data, Some(json!([{"id": 1}])));
}

#[tokio::test]
async fn failed_write_leaves_cache_untouched() {
    let client = client();
    let products = EntityKind::Products.root();
    let categories = EntityKind::Categories.root();
    seed(&client, &products, json!([{"id": 4}, {"id": 5}]));
    seed(&client, &categories, json!([{"id": 1}]));
    let before = (
        client.store().get(&products).expect("products"),
        client.store().get(&categories).expect("categories"),
    );

    let mutation: Mutation<Vec<i64>, ()> =
        Mutation::for_kind(&client, MutationKind::ProductsDeleted, |_ids| async {
            Err(QueryError::backend(500, Some("database unavailable".into())))
        });
    mutation.execute(vec![4, 5]).await.expect_err("write fails");

    assert_eq!(client.store().get(&products).expect("products"), before.0);
    assert_eq!(client.store().get(&categories).expect("categories"), before.1);
    assert_eq!(mutation.status(), MutationStatus::Error);
    assert!(
        !client
            .events()
            .snapshot()
            .iter()
            .any(|event| matches!(event.kind, EventKind::Invalidated { .. }))
    );

    mutation.reset();
    assert_eq!(mutation.status(), MutationStatus::Idle);
}

#[tokio::test]
async fn invalidations_are_applied_before_success_callback() {
    let client = client();
    let products = EntityKind::Products.root();
    let categories = EntityKind::Categories.root();
    seed(&client, &products, json!([]));
    seed(&client, &categories, json!([]));

    let observed = Arc::new(Mutex::new(Vec::new()));
    let store = client.store().clone();
    let seen = observed.clone();
    let (products_key, categories_key) = (products.clone(), categories.clone());
    let mutation: Mutation<(), ()> =
        Mutation::for_kind(&client, MutationKind::ProductCreated, |_| async {
            Ok::<_, QueryError>(())
        })
        .on_success(move |_| {
            let mut seen = seen.lock().expect("observed");
            for key in [&products_key, &categories_key] {
                seen.push(store.get(key).map(|entry| entry.status));
            }
        });

    mutation.execute(()).await.expect("write succeeds");

    assert_eq!(
        *observed.lock().expect("observed"),
        vec![Some(FetchStatus::Stale), Some(FetchStatus::Stale)]
    );
}

// ============================================================================
// Against a mocked backend
// ============================================================================

fn context(server: &MockServer) -> (AdminContext, Arc<MemoryNotifier>) {
    let settings = BackendSettings {
        base_url: Url::parse(&server.url("/api/")).expect("url"),
        api_token: None,
        timeout: Duration::from_secs(5),
    };
    let notifier = Arc::new(MemoryNotifier::new());
    let ctx = AdminContext::new(
        client(),
        BackendClient::new(&settings).expect("backend client"),
        notifier.clone(),
    );
    (ctx, notifier)
}

#[tokio::test]
async fn created_category_shows_up_in_mounted_list() {
    let server = MockServer::start_async().await;
    let mut initial = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/categories");
            then.status(200).json_body(json!([{"id": 1, "name": "Fruits"}]));
        })
        .await;
    let (ctx, notifier) = context(&server);

    let mut view = ctx.client().mount(ctx.categories().list());
    let snapshot = view.settled().await;
    assert_eq!(snapshot.data.map(|rows: Vec<Category>| rows.len()), Some(1));

    initial.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/categories");
            then.status(200).json_body(json!([
                {"id": 1, "name": "Fruits"},
                {"id": 2, "name": "Dairy"}
            ]));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/categories")
                .json_body(json!({"name": "Dairy"}));
            then.status(201).json_body(json!({"id": 2, "name": "Dairy"}));
        })
        .await;

    let mutation = ctx.categories().create();
    let created = ctx
        .submit(
            &mutation,
            CategoryRequest {
                name: "Dairy".into(),
                description: None,
                parent_id: None,
            },
        )
        .await
        .expect("category created");

    // The refetch has been issued but not yet resolved.
    assert_eq!(view.snapshot().status, FetchStatus::Loading);
    assert_eq!(created.id, 2);
    create.assert_async().await;

    let snapshot = view.settled().await;
    let names: Vec<String> = snapshot
        .data
        .expect("categories")
        .into_iter()
        .map(|category| category.name)
        .collect();
    assert_eq!(names, vec!["Fruits", "Dairy"]);
    assert_eq!(notifier.notifications()[0].title, "Category created");
}

#[tokio::test]
async fn failed_bulk_delete_keeps_lists_and_skips_refetch() {
    let server = MockServer::start_async().await;
    let products = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/products");
            then.status(200).json_body(json!([
                {"id": 4, "name": "Mango", "category_id": 1},
                {"id": 5, "name": "Papaya", "category_id": 1}
            ]));
        })
        .await;
    let categories = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/categories");
            then.status(200).json_body(json!([{"id": 1, "name": "Fruits"}]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/products/bulk-delete");
            then.status(500)
                .json_body(json!({"message": "database unavailable"}));
        })
        .await;
    let (ctx, notifier) = context(&server);

    let mut product_view = ctx.client().mount(ctx.products().list());
    let mut category_view = ctx.client().mount(ctx.categories().list());
    let before_products: Vec<Product> = product_view.settled().await.data.expect("products");
    let before_categories: Vec<Category> =
        category_view.settled().await.data.expect("categories");

    let mutation = ctx.products().bulk_delete();
    let err = ctx
        .submit(&mutation, vec![4, 5])
        .await
        .expect_err("backend failure");

    assert_eq!(err.operator_message(), "database unavailable");
    assert_eq!(mutation.status(), MutationStatus::Error);
    assert_eq!(
        notifier.notifications()[0].description.as_deref(),
        Some("database unavailable")
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(product_view.snapshot().status, FetchStatus::Success);
    assert_eq!(product_view.snapshot().data, Some(before_products));
    assert_eq!(category_view.snapshot().data, Some(before_categories));
    assert_eq!(products.hits_async().await, 1);
    assert_eq!(categories.hits_async().await, 1);

    mutation.reset();
    assert_eq!(mutation.status(), MutationStatus::Idle);
}
