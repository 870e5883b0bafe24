//! Operator command line: one handler per resource plus `watch`.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::application::admin::AdminContext;
use crate::application::error::AppError;
use crate::application::notify::Notifier;
use crate::application::session::{Principal, SessionGuard};
use crate::cache::{FetchStatus, QueryClient, QueryConfig, QueryOptions};
use crate::config::{Command, Settings};
use crate::infra::http::BackendClient;

pub mod handlers;
mod print;

pub use print::{print_json, render_json};

const OPERATOR: &str = "loumo-admin";

/// Everything a command needs: services over one query client and the
/// operator session.
#[derive(Clone)]
pub struct Ctx {
    pub admin: AdminContext,
    pub session: SessionGuard,
}

impl Ctx {
    pub fn new(settings: &Settings, notifier: Arc<dyn Notifier>) -> Result<Self, AppError> {
        let client = QueryClient::new(QueryConfig::from(&settings.query));
        let backend = BackendClient::new(&settings.backend)?;
        let session = SessionGuard::new(&settings.session);
        session.sign_in(Principal::new(OPERATOR));

        Ok(Self {
            admin: AdminContext::new(client, backend, notifier),
            session,
        })
    }

    /// Mount `options`, wait for the first settled result and unmount.
    pub async fn fetch<T>(&self, options: QueryOptions<T>) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let mut handle = self.admin.client().mount(options);
        let snapshot = handle.settled().await;
        match (snapshot.status, snapshot.data, snapshot.error) {
            (FetchStatus::Error, _, Some(error)) => Err(error.into()),
            (_, Some(data), _) => Ok(data),
            (status, None, _) => Err(AppError::unexpected(format!(
                "query {} settled as {status} without data",
                handle.key()
            ))),
        }
    }
}

pub async fn dispatch(ctx: &Ctx, command: Command) -> Result<(), AppError> {
    ctx.session.touch();
    match command {
        Command::Categories(args) => handlers::catalog::categories(ctx, args.action).await,
        Command::Products(args) => handlers::catalog::products(ctx, args.action).await,
        Command::Orders(args) => handlers::orders::handle(ctx, args.action).await,
        Command::Deliveries(args) => handlers::logistics::deliveries(ctx, args.action).await,
        Command::Agents(args) => handlers::logistics::agents(ctx, args.action).await,
        Command::Zones(args) => handlers::logistics::zones(ctx, args.action).await,
        Command::Clients(args) => handlers::clients::handle(ctx, args.action).await,
        Command::Settings(args) => handlers::content::settings(ctx, args.action).await,
        Command::Pages(args) => handlers::content::pages(ctx, args.action).await,
        Command::Watch(args) => handlers::watch::handle(ctx, args).await,
    }
}
