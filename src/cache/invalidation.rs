//! Invalidation declarations.
//!
//! Every back-office write maps to the cached families it makes stale. The
//! table lives here, in one place, instead of being repeated at each call
//! site.

use std::fmt;

use loumo_api_types::Id;

use super::keys::{CacheKey, EntityKind};

/// Which matching entries are refetched immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InvalidationScope {
    /// Only entries with at least one subscriber.
    #[default]
    Active,
    /// Every matching entry with a registered fetcher.
    All,
}

impl InvalidationScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::All => "all",
        }
    }
}

impl fmt::Display for InvalidationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to mark a set of key families stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    pub prefixes: Vec<CacheKey>,
    pub scope: InvalidationScope,
}

impl Invalidation {
    pub fn active(prefixes: impl IntoIterator<Item = CacheKey>) -> Self {
        Self {
            prefixes: prefixes.into_iter().collect(),
            scope: InvalidationScope::Active,
        }
    }

    pub fn all(prefixes: impl IntoIterator<Item = CacheKey>) -> Self {
        Self {
            prefixes: prefixes.into_iter().collect(),
            scope: InvalidationScope::All,
        }
    }
}

/// Back-office writes that affect cached collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    CategoryCreated,
    CategoryUpdated,
    CategoryDeleted,
    ProductCreated,
    ProductUpdated,
    ProductsDeleted,
    VariantChanged { product_id: Id },
    ProductImageUploaded { product_id: Id },
    OrderStatusUpdated,
    OrdersBulkUpdated,
    DeliveryAssigned,
    DeliveryStatusUpdated,
    AgentCreated,
    AgentUpdated,
    AgentDeleted,
    ZoneCreated,
    ZoneUpdated,
    ZoneDeleted,
    ClientUpdated,
    ClientDeleted,
    SettingsUpdated,
    PageUpdated,
}

impl MutationKind {
    /// Stable snake_case name used in logs, metrics and the event journal.
    pub fn name(self) -> &'static str {
        match self {
            Self::CategoryCreated => "category_created",
            Self::CategoryUpdated => "category_updated",
            Self::CategoryDeleted => "category_deleted",
            Self::ProductCreated => "product_created",
            Self::ProductUpdated => "product_updated",
            Self::ProductsDeleted => "products_deleted",
            Self::VariantChanged { .. } => "variant_changed",
            Self::ProductImageUploaded { .. } => "product_image_uploaded",
            Self::OrderStatusUpdated => "order_status_updated",
            Self::OrdersBulkUpdated => "orders_bulk_updated",
            Self::DeliveryAssigned => "delivery_assigned",
            Self::DeliveryStatusUpdated => "delivery_status_updated",
            Self::AgentCreated => "agent_created",
            Self::AgentUpdated => "agent_updated",
            Self::AgentDeleted => "agent_deleted",
            Self::ZoneCreated => "zone_created",
            Self::ZoneUpdated => "zone_updated",
            Self::ZoneDeleted => "zone_deleted",
            Self::ClientUpdated => "client_updated",
            Self::ClientDeleted => "client_deleted",
            Self::SettingsUpdated => "settings_updated",
            Self::PageUpdated => "page_updated",
        }
    }

    /// Invalidations applied, in order, after the write succeeds.
    pub fn invalidations(self) -> Vec<Invalidation> {
        use EntityKind::*;

        match self {
            Self::CategoryCreated | Self::CategoryUpdated | Self::CategoryDeleted => {
                vec![Invalidation::active([Categories.root(), Products.root()])]
            }
            Self::ProductCreated | Self::ProductUpdated | Self::ProductsDeleted => {
                vec![Invalidation::active([Products.root(), Categories.root()])]
            }
            Self::VariantChanged { product_id } => vec![Invalidation::active([
                Products.item(product_id),
                Products.root(),
            ])],
            Self::ProductImageUploaded { product_id } => {
                vec![Invalidation::active([Products.item(product_id)])]
            }
            Self::OrderStatusUpdated | Self::OrdersBulkUpdated => {
                vec![Invalidation::active([Orders.root(), Deliveries.root()])]
            }
            // Agent availability is shown on screens that may not be mounted.
            Self::DeliveryAssigned => vec![
                Invalidation::active([Deliveries.root(), Orders.root()]),
                Invalidation::all([Agents.root()]),
            ],
            Self::DeliveryStatusUpdated => {
                vec![Invalidation::active([Deliveries.root(), Orders.root()])]
            }
            Self::AgentCreated | Self::AgentUpdated | Self::AgentDeleted => {
                vec![Invalidation::active([Agents.root(), Deliveries.root()])]
            }
            Self::ZoneCreated | Self::ZoneUpdated | Self::ZoneDeleted => {
                vec![Invalidation::active([Zones.root()])]
            }
            Self::ClientUpdated | Self::ClientDeleted => {
                vec![Invalidation::active([Clients.root(), Orders.root()])]
            }
            Self::SettingsUpdated => vec![Invalidation::active([Settings.root()])],
            Self::PageUpdated => vec![Invalidation::active([Pages.root()])],
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
