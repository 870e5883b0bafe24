use loumo_api_types::{AgentRequest, DeliveryAssignRequest, DeliveryStatusRequest, ZoneRequest};

use crate::application::admin::Update;
use crate::application::error::AppError;
use crate::cli::{Ctx, print_json};
use crate::config::{AgentFields, AgentsCmd, DeliveriesCmd, ZoneFields, ZonesCmd};
use crate::domain::filters::filter_deliveries;

pub async fn deliveries(ctx: &Ctx, cmd: DeliveriesCmd) -> Result<(), AppError> {
    let service = ctx.admin.deliveries();
    match cmd {
        DeliveriesCmd::List { status } => {
            let deliveries = ctx.fetch(service.list()).await?;
            print_json(&filter_deliveries(deliveries, status.map(Into::into)))
        }
        DeliveriesCmd::Assign { id, agent_id } => {
            let delivery = ctx
                .admin
                .submit(
                    &service.assign(),
                    Update::new(id, DeliveryAssignRequest { agent_id }),
                )
                .await?;
            print_json(&delivery)
        }
        DeliveriesCmd::SetStatus { id, status } => {
            let request = DeliveryStatusRequest {
                status: status.into(),
            };
            let delivery = ctx
                .admin
                .submit(&service.set_status(), Update::new(id, request))
                .await?;
            print_json(&delivery)
        }
    }
}

pub async fn agents(ctx: &Ctx, cmd: AgentsCmd) -> Result<(), AppError> {
    let service = ctx.admin.agents();
    match cmd {
        AgentsCmd::List => print_json(&ctx.fetch(service.list()).await?),
        AgentsCmd::Create(fields) => {
            let agent = ctx.admin.submit(&service.create(), agent_request(fields)).await?;
            print_json(&agent)
        }
        AgentsCmd::Update { id, fields } => {
            let agent = ctx
                .admin
                .submit(&service.update(), Update::new(id, agent_request(fields)))
                .await?;
            print_json(&agent)
        }
        AgentsCmd::Delete { id } => {
            ctx.admin.submit(&service.delete(), id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}

pub async fn zones(ctx: &Ctx, cmd: ZonesCmd) -> Result<(), AppError> {
    let service = ctx.admin.zones();
    match cmd {
        ZonesCmd::List => print_json(&ctx.fetch(service.list()).await?),
        ZonesCmd::Addresses { id } => print_json(&ctx.fetch(service.addresses(id)).await?),
        ZonesCmd::Create(fields) => {
            let zone = ctx.admin.submit(&service.create(), zone_request(fields)).await?;
            print_json(&zone)
        }
        ZonesCmd::Update { id, fields } => {
            let zone = ctx
                .admin
                .submit(&service.update(), Update::new(id, zone_request(fields)))
                .await?;
            print_json(&zone)
        }
        ZonesCmd::Delete { id } => {
            ctx.admin.submit(&service.delete(), id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}

fn agent_request(fields: AgentFields) -> AgentRequest {
    AgentRequest {
        full_name: fields.full_name,
        phone: fields.phone,
        zone_id: fields.zone_id,
    }
}

fn zone_request(fields: ZoneFields) -> ZoneRequest {
    ZoneRequest {
        name: fields.name,
        delivery_fee: fields.delivery_fee,
        active: fields.active,
    }
}
