use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use loumo_admin::cache::{
    EntityKind, Invalidation, Mutation, MutationKind, QueryClient, QueryConfig, QueryError,
    QueryOptions,
};
use metrics_util::debugging::DebuggingRecorder;
use serde_json::{Value, json};
use tokio::sync::oneshot;

fn immediate(key: loumo_admin::cache::CacheKey) -> QueryOptions<Value> {
    QueryOptions::new(key, || async { Ok::<_, QueryError>(json!([])) })
}

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // A one-entry journal drops events; a one-entry idle list evicts.
    let client = QueryClient::new(QueryConfig {
        retry_count: 0,
        max_idle_entries: 1,
        event_log_limit: 1,
        ..QueryConfig::default()
    });

    // Applied fetch, then eviction of an idle entry.
    for id in [1, 2] {
        let mut view = client.mount(immediate(EntityKind::Products.item(id)));
        view.settled().await;
    }

    // Superseded fetch: the view goes away before the response arrives.
    let (tx, rx) = oneshot::channel::<Value>();
    let gate = Arc::new(Mutex::new(Some(rx)));
    let view = client.mount(QueryOptions::new(EntityKind::Orders.root(), move || {
        let rx = gate.lock().expect("gate").take();
        async move {
            match rx {
                Some(rx) => rx.await.map_err(|_| QueryError::transport("gate dropped")),
                None => Err(QueryError::transport("already consumed")),
            }
        }
    }));
    tokio::task::yield_now().await;
    drop(view);
    tx.send(json!([])).expect("gate open");
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Invalidation and mutation outcomes.
    client.invalidate(&Invalidation::active([EntityKind::Orders.root()]));
    let mutation: Mutation<(), ()> =
        Mutation::for_kind(&client, MutationKind::ZoneCreated, |_| async {
            Ok::<_, QueryError>(())
        });
    mutation.execute(()).await.expect("mutation succeeds");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for expected in [
        "loumo_cache_entries",
        "loumo_cache_evict_total",
        "loumo_cache_event_dropped_total",
        "loumo_cache_invalidated_total",
        "loumo_query_fetch_total",
        "loumo_query_fetch_ms",
        "loumo_query_superseded_total",
        "loumo_mutation_total",
    ] {
        assert!(names.contains(expected), "missing metric {expected}");
    }
}
