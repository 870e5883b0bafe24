use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Id, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Available,
    Busy,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: Id,
    pub full_name: String,
    pub phone: String,
    pub status: AgentStatus,
    #[serde(default)]
    pub zone_id: Option<Id>,
    #[serde(default)]
    pub active_deliveries: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub full_name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<Id>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Unassigned,
    Assigned,
    PickedUp,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    /// Order status the backend moves the parent order to for this delivery status.
    pub fn order_status(self) -> Option<OrderStatus> {
        match self {
            Self::Unassigned | Self::Assigned => None,
            Self::PickedUp => Some(OrderStatus::InTransit),
            Self::Delivered => Some(OrderStatus::Completed),
            Self::Failed => Some(OrderStatus::Failed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: Id,
    pub order_id: Id,
    #[serde(default)]
    pub agent_id: Option<Id>,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub scheduled_for: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAssignRequest {
    pub agent_id: Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStatusRequest {
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: Id,
    pub name: String,
    pub delivery_fee: f64,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRequest {
    pub name: String,
    pub delivery_fee: f64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: Id,
    pub label: String,
    pub street: String,
    #[serde(default)]
    pub zone_id: Option<Id>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}
