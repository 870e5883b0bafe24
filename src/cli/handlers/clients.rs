use loumo_api_types::ClientUpdateRequest;

use crate::application::admin::Update;
use crate::application::error::AppError;
use crate::cli::{Ctx, print_json};
use crate::config::ClientsCmd;
use crate::domain::filters::filter_clients;

pub async fn handle(ctx: &Ctx, cmd: ClientsCmd) -> Result<(), AppError> {
    let service = ctx.admin.clients();
    match cmd {
        ClientsCmd::List { search } => {
            let clients = ctx.fetch(service.list()).await?;
            print_json(&filter_clients(clients, search.as_deref()))
        }
        ClientsCmd::Update {
            id,
            full_name,
            email,
            phone,
            active,
        } => {
            let request = ClientUpdateRequest {
                full_name,
                email,
                phone,
                active,
            };
            let client = ctx
                .admin
                .submit(&service.update(), Update::new(id, request))
                .await?;
            print_json(&client)
        }
        ClientsCmd::Delete { id } => {
            ctx.admin.submit(&service.delete(), id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}
