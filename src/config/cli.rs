//! Command-line surface for `loumo-admin`.

use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};
use loumo_api_types::{DeliveryStatus, Id, OrderStatus};

use crate::cache::EntityKind;

/// Command-line arguments for the Loumo back-office client.
#[derive(Debug, Parser)]
#[command(name = "loumo-admin", version, about = "Loumo grocery back-office client")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "LOUMO_CONFIG_FILE", value_name = "PATH", global = true)]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the backend base URL.
    #[arg(long = "backend-url", value_name = "URL", global = true)]
    pub backend_url: Option<String>,

    /// Override the backend request timeout in milliseconds.
    #[arg(long = "backend-timeout-ms", value_name = "MILLIS", global = true)]
    pub backend_timeout_ms: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Category management
    Categories(CategoriesArgs),
    /// Products, variants and images
    Products(ProductsArgs),
    /// Order lifecycle
    Orders(OrdersArgs),
    /// Delivery assignment and tracking
    Deliveries(DeliveriesArgs),
    /// Delivery agents
    Agents(AgentsArgs),
    /// Delivery zones and addresses
    Zones(ZonesArgs),
    /// Client accounts
    Clients(ClientsArgs),
    /// Store settings
    Settings(SettingsArgs),
    /// CMS pages
    Pages(PagesArgs),
    /// Mount a live view and print every settled snapshot
    Watch(WatchArgs),
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Args, Clone)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    pub action: CategoriesCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CategoriesCmd {
    /// List categories
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Create a category
    Create(CategoryFields),
    /// Replace a category
    Update {
        #[arg(long)]
        id: Id,
        #[command(flatten)]
        fields: CategoryFields,
    },
    /// Delete a category
    Delete {
        #[arg(long)]
        id: Id,
    },
}

#[derive(Debug, Args, Clone)]
pub struct CategoryFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub parent_id: Option<Id>,
}

#[derive(Debug, Args, Clone)]
pub struct ProductsArgs {
    #[command(subcommand)]
    pub action: ProductsCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ProductsCmd {
    /// List products with optional client-side filters
    List {
        #[arg(long)]
        category_id: Option<Id>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        published: Option<bool>,
    },
    /// Show one product with its variants
    Show {
        #[arg(long)]
        id: Id,
    },
    /// Create a product
    Create(ProductFields),
    /// Replace a product
    Update {
        #[arg(long)]
        id: Id,
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Delete several products in one call
    Delete {
        #[arg(long = "ids", value_delimiter = ',', num_args = 1.., required = true)]
        ids: Vec<Id>,
    },
    /// Add a variant to a product
    AddVariant {
        #[arg(long)]
        product_id: Id,
        #[command(flatten)]
        fields: VariantFields,
    },
    /// Replace a variant
    UpdateVariant {
        #[arg(long)]
        product_id: Id,
        #[arg(long)]
        variant_id: Id,
        #[command(flatten)]
        fields: VariantFields,
    },
    /// Delete a variant
    DeleteVariant {
        #[arg(long)]
        product_id: Id,
        #[arg(long)]
        variant_id: Id,
    },
    /// Upload an image for a product
    UploadImage {
        #[arg(long)]
        product_id: Id,
        #[arg(long, value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
}

#[derive(Debug, Args, Clone)]
pub struct ProductFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub category_id: Id,
    #[arg(long, default_value_t = false)]
    pub published: bool,
}

#[derive(Debug, Args, Clone)]
pub struct VariantFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub price: f64,
    #[arg(long, default_value_t = 0)]
    pub stock: i64,
    #[arg(long)]
    pub sku: Option<String>,
}

// ============================================================================
// Orders and logistics
// ============================================================================

#[derive(Debug, Args, Clone)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub action: OrdersCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum OrdersCmd {
    /// List orders with optional client-side filters
    List {
        #[arg(long)]
        status: Option<OrderStatusArg>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = OrderSortArg::Newest)]
        sort: OrderSortArg,
    },
    /// Move one order to a new status
    SetStatus {
        #[arg(long)]
        id: Id,
        #[arg(long)]
        status: OrderStatusArg,
    },
    /// Move several orders to a new status in one call
    BulkStatus {
        #[arg(long = "ids", value_delimiter = ',', num_args = 1.., required = true)]
        ids: Vec<Id>,
        #[arg(long)]
        status: OrderStatusArg,
    },
}

#[derive(Debug, Args, Clone)]
pub struct DeliveriesArgs {
    #[command(subcommand)]
    pub action: DeliveriesCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum DeliveriesCmd {
    /// List deliveries
    List {
        #[arg(long)]
        status: Option<DeliveryStatusArg>,
    },
    /// Assign a delivery to an agent
    Assign {
        #[arg(long)]
        id: Id,
        #[arg(long)]
        agent_id: Id,
    },
    /// Move a delivery to a new status
    SetStatus {
        #[arg(long)]
        id: Id,
        #[arg(long)]
        status: DeliveryStatusArg,
    },
}

#[derive(Debug, Args, Clone)]
pub struct AgentsArgs {
    #[command(subcommand)]
    pub action: AgentsCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum AgentsCmd {
    /// List agents
    List,
    /// Create an agent
    Create(AgentFields),
    /// Replace an agent
    Update {
        #[arg(long)]
        id: Id,
        #[command(flatten)]
        fields: AgentFields,
    },
    /// Delete an agent
    Delete {
        #[arg(long)]
        id: Id,
    },
}

#[derive(Debug, Args, Clone)]
pub struct AgentFields {
    #[arg(long)]
    pub full_name: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub zone_id: Option<Id>,
}

#[derive(Debug, Args, Clone)]
pub struct ZonesArgs {
    #[command(subcommand)]
    pub action: ZonesCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ZonesCmd {
    /// List zones
    List,
    /// Create a zone
    Create(ZoneFields),
    /// Replace a zone
    Update {
        #[arg(long)]
        id: Id,
        #[command(flatten)]
        fields: ZoneFields,
    },
    /// Delete a zone
    Delete {
        #[arg(long)]
        id: Id,
    },
    /// List the addresses of a zone
    Addresses {
        #[arg(long)]
        id: Id,
    },
}

#[derive(Debug, Args, Clone)]
pub struct ZoneFields {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value_t = 0.0)]
    pub delivery_fee: f64,
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub active: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ClientsArgs {
    #[command(subcommand)]
    pub action: ClientsCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ClientsCmd {
    /// List clients
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Replace a client's profile
    Update {
        #[arg(long)]
        id: Id,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Delete a client
    Delete {
        #[arg(long)]
        id: Id,
    },
}

// ============================================================================
// Content
// ============================================================================

#[derive(Debug, Args, Clone)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub action: SettingsCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum SettingsCmd {
    /// Show store settings
    Show,
    /// Update selected store settings; omitted fields keep their value
    Set(SettingsPatchArgs),
}

#[derive(Debug, Args, Clone, Default)]
pub struct SettingsPatchArgs {
    #[arg(long)]
    pub store_name: Option<String>,
    #[arg(long)]
    pub contact_email: Option<String>,
    #[arg(long)]
    pub contact_phone: Option<String>,
    #[arg(long)]
    pub currency: Option<String>,
    #[arg(long)]
    pub minimum_order: Option<f64>,
    #[arg(long)]
    pub maintenance_mode: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct PagesArgs {
    #[command(subcommand)]
    pub action: PagesCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum PagesCmd {
    /// List pages
    List,
    /// Replace a page's content
    Update {
        #[arg(long)]
        slug: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: Option<String>,
        #[arg(long, value_hint = ValueHint::FilePath)]
        body_file: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        published: bool,
    },
}

// ============================================================================
// Watch
// ============================================================================

#[derive(Debug, Args, Clone)]
pub struct WatchArgs {
    /// Collection to mount
    #[arg(value_enum)]
    pub resource: ResourceArg,

    /// Refetch the view periodically
    #[arg(long = "interval-ms", value_name = "MILLIS")]
    pub interval_ms: Option<u64>,

    /// Stop after this many settled snapshots
    #[arg(long = "max-updates", value_name = "COUNT")]
    pub max_updates: Option<usize>,
}

// ============================================================================
// Value enums
// ============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResourceArg {
    Categories,
    Products,
    Orders,
    Deliveries,
    Agents,
    Zones,
    Clients,
    Settings,
    Pages,
}

impl From<ResourceArg> for EntityKind {
    fn from(value: ResourceArg) -> Self {
        match value {
            ResourceArg::Categories => EntityKind::Categories,
            ResourceArg::Products => EntityKind::Products,
            ResourceArg::Orders => EntityKind::Orders,
            ResourceArg::Deliveries => EntityKind::Deliveries,
            ResourceArg::Agents => EntityKind::Agents,
            ResourceArg::Zones => EntityKind::Zones,
            ResourceArg::Clients => EntityKind::Clients,
            ResourceArg::Settings => EntityKind::Settings,
            ResourceArg::Pages => EntityKind::Pages,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OrderStatusArg {
    Pending,
    Accepted,
    Preparing,
    InTransit,
    Completed,
    Rejected,
    Failed,
}

impl From<OrderStatusArg> for OrderStatus {
    fn from(value: OrderStatusArg) -> Self {
        match value {
            OrderStatusArg::Pending => OrderStatus::Pending,
            OrderStatusArg::Accepted => OrderStatus::Accepted,
            OrderStatusArg::Preparing => OrderStatus::Preparing,
            OrderStatusArg::InTransit => OrderStatus::InTransit,
            OrderStatusArg::Completed => OrderStatus::Completed,
            OrderStatusArg::Rejected => OrderStatus::Rejected,
            OrderStatusArg::Failed => OrderStatus::Failed,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DeliveryStatusArg {
    Unassigned,
    Assigned,
    PickedUp,
    Delivered,
    Failed,
}

impl From<DeliveryStatusArg> for DeliveryStatus {
    fn from(value: DeliveryStatusArg) -> Self {
        match value {
            DeliveryStatusArg::Unassigned => DeliveryStatus::Unassigned,
            DeliveryStatusArg::Assigned => DeliveryStatus::Assigned,
            DeliveryStatusArg::PickedUp => DeliveryStatus::PickedUp,
            DeliveryStatusArg::Delivered => DeliveryStatus::Delivered,
            DeliveryStatusArg::Failed => DeliveryStatus::Failed,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum OrderSortArg {
    #[default]
    Newest,
    Oldest,
    Total,
}

impl fmt::Display for OrderSortArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Total => "total",
        };
        f.write_str(value)
    }
}
