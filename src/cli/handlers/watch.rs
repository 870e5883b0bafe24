//! `watch`: keep one view mounted and print every settled snapshot.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use tracing::info;

use crate::application::error::AppError;
use crate::cache::{QueryHandle, QueryOptions, QuerySnapshot};
use crate::cli::{Ctx, print_json};
use crate::config::{ResourceArg, WatchArgs};
use crate::infra::error::InfraError;

pub async fn handle(ctx: &Ctx, args: WatchArgs) -> Result<(), AppError> {
    let admin = &ctx.admin;
    match args.resource {
        ResourceArg::Categories => watch(ctx, admin.categories().list(), &args).await,
        ResourceArg::Products => watch(ctx, admin.products().list(), &args).await,
        ResourceArg::Orders => watch(ctx, admin.orders().list(), &args).await,
        ResourceArg::Deliveries => watch(ctx, admin.deliveries().list(), &args).await,
        ResourceArg::Agents => watch(ctx, admin.agents().list(), &args).await,
        ResourceArg::Zones => watch(ctx, admin.zones().list(), &args).await,
        ResourceArg::Clients => watch(ctx, admin.clients().list(), &args).await,
        ResourceArg::Settings => watch(ctx, admin.content().settings(), &args).await,
        ResourceArg::Pages => watch(ctx, admin.content().pages(), &args).await,
    }
}

async fn watch<T>(ctx: &Ctx, options: QueryOptions<T>, args: &WatchArgs) -> Result<(), AppError>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    let mut policy = ctx.admin.client().config().default_policy();
    if let Some(millis) = args.interval_ms.filter(|millis| *millis > 0) {
        policy = policy.with_interval(Duration::from_millis(millis));
    }

    let mut handle = ctx.admin.client().mount(options.policy(policy));
    let idle_watch = ctx.session.spawn_idle_watch();
    let mut printed = 0_usize;
    let mut first = true;

    let outcome = loop {
        tokio::select! {
            next = next_settled(&mut handle, first) => {
                let Some(snapshot) = next else {
                    break Ok(());
                };
                first = false;
                print_json(&render_update(&handle, &snapshot))?;
                printed += 1;
                if args.max_updates.is_some_and(|max| printed >= max) {
                    break Ok(());
                }
            }
            () = ctx.session.ended() => {
                info!(key = %handle.key(), "Session ended; closing view");
                break Ok(());
            }
            signal = tokio::signal::ctrl_c() => {
                info!(key = %handle.key(), "Interrupted; closing view");
                break signal.map_err(|err| AppError::from(InfraError::Signal(err)));
            }
        }
    };

    idle_watch.abort();
    outcome
}

async fn next_settled<T: DeserializeOwned>(
    handle: &mut QueryHandle<T>,
    first: bool,
) -> Option<QuerySnapshot<T>> {
    if !first && !handle.changed().await {
        return None;
    }
    Some(handle.settled().await)
}

fn render_update<T: Serialize + DeserializeOwned>(
    handle: &QueryHandle<T>,
    snapshot: &QuerySnapshot<T>,
) -> serde_json::Value {
    json!({
        "key": handle.key().to_string(),
        "status": snapshot.status.as_str(),
        "fetched_at": snapshot
            .last_fetched_at
            .and_then(|at| at.format(&Rfc3339).ok()),
        "error": snapshot.error.as_ref().map(ToString::to_string),
        "data": snapshot.data,
    })
}
