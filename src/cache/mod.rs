//! Loumo query cache.
//!
//! Client-side cache of back-office collections with declarative
//! invalidation:
//!
//! - **Entity store**: keyed entries with freshness state and subscribers
//! - **Queries**: mounted views that fetch, retry and refetch their key
//! - **Mutations**: writes that mark the collections they affect stale
//!
//! ## Configuration
//!
//! Refetch behaviour is controlled via the `[query]` section of
//! `loumo-admin.toml`:
//!
//! ```toml
//! [query]
//! retry_count = 1
//! retry_delay_ms = 1000
//! refetch_on_window_focus = true
//! max_idle_entries = 500
//! ```

mod client;
mod config;
mod entry;
mod events;
mod invalidation;
mod keys;
pub(crate) mod lock;
mod mutation;
mod query;
mod registry;
mod store;

pub use client::QueryClient;
pub use config::{QueryConfig, RefetchPolicy};
pub use entry::{CacheEntry, EntryPatch, FetchOutcome, FetchStatus, QueryError};
pub use events::{CacheEvent, Epoch, EventKind, EventLog};
pub use invalidation::{Invalidation, InvalidationScope, MutationKind};
pub use keys::{CacheKey, EntityKind, KeySegment};
pub use mutation::{Mutation, MutationError, MutationState, MutationStatus};
pub use query::{QueryHandle, QueryOptions, QuerySnapshot};
pub use registry::{FetchFuture, Fetcher, FetcherRegistry, Registration};
pub use store::{EntityStore, Subscription};
