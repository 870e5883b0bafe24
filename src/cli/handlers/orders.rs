use loumo_api_types::{OrderBulkStatusRequest, OrderStatusRequest};

use crate::application::admin::Update;
use crate::application::error::AppError;
use crate::cli::{Ctx, print_json};
use crate::config::{OrderSortArg, OrdersCmd};
use crate::domain::filters::{OrderFilter, OrderSort};

pub async fn handle(ctx: &Ctx, cmd: OrdersCmd) -> Result<(), AppError> {
    let service = ctx.admin.orders();
    match cmd {
        OrdersCmd::List {
            status,
            search,
            sort,
        } => {
            let filter = OrderFilter {
                status: status.map(Into::into),
                search,
                sort: order_sort(sort),
            };
            let orders = ctx.fetch(service.list()).await?;
            print_json(&filter.apply(orders))
        }
        OrdersCmd::SetStatus { id, status } => {
            let request = OrderStatusRequest {
                status: status.into(),
            };
            let order = ctx
                .admin
                .submit(&service.set_status(), Update::new(id, request))
                .await?;
            print_json(&order)
        }
        OrdersCmd::BulkStatus { ids, status } => {
            let request = OrderBulkStatusRequest {
                ids,
                status: status.into(),
            };
            let ack = ctx.admin.submit(&service.bulk_status(), request).await?;
            print_json(&ack)
        }
    }
}

fn order_sort(sort: OrderSortArg) -> OrderSort {
    match sort {
        OrderSortArg::Newest => OrderSort::Newest,
        OrderSortArg::Oldest => OrderSort::Oldest,
        OrderSortArg::Total => OrderSort::Total,
    }
}
