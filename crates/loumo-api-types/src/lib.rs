//! Wire types shared by the Loumo back-office client and its tests.
//!
//! Shapes mirror the REST backend; field names are snake_case on the wire.

mod catalog;
mod content;
mod logistics;
mod orders;

pub use catalog::{
    Category, CategoryRequest, Product, ProductBulkDeleteRequest, ProductImage, ProductRequest,
    ProductVariant, VariantRequest,
};
pub use content::{PageRecord, PageUpdateRequest, SettingsRecord, SettingsUpdateRequest};
pub use logistics::{
    Address, Agent, AgentRequest, AgentStatus, Delivery, DeliveryAssignRequest, DeliveryStatus,
    DeliveryStatusRequest, Zone, ZoneRequest,
};
pub use orders::{
    Client, ClientUpdateRequest, Order, OrderBulkStatusRequest, OrderLine, OrderStatus,
    OrderStatusRequest,
};

use serde::{Deserialize, Serialize};

/// Identifier type used by every backend resource.
pub type Id = i64;

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Acknowledgement body for writes that return no resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub affected: u64,
}
