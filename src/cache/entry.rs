//! Cache entry snapshots and the error type stored in them.

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

use super::keys::CacheKey;

/// Freshness state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FetchStatus {
    /// Created but never fetched.
    #[default]
    Idle,
    /// A fetch is in flight; previous data (if any) is still visible.
    Loading,
    /// The latest fetch succeeded.
    Success,
    /// The latest fetch failed.
    Error,
    /// Invalidated; data may be outdated until the next fetch resolves.
    Stale,
}

impl FetchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
            Self::Stale => "stale",
        }
    }

    /// A mounting view must fetch an entry in this state.
    pub fn needs_fetch(self) -> bool {
        matches!(self, Self::Idle | Self::Error | Self::Stale)
    }

    /// No fetch is outstanding for the entry.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a retrieval or write function.
///
/// Cloneable so it can live inside cache entries and mutation state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("backend returned status {status}{}", detail_suffix(.message))]
    Backend {
        status: u16,
        message: Option<String>,
    },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

fn detail_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|message| format!(": {message}"))
        .unwrap_or_default()
}

impl QueryError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn backend(status: u16, message: Option<String>) -> Self {
        Self::Backend { status, message }
    }

    pub fn decode(message: impl fmt::Display) -> Self {
        Self::Decode(message.to_string())
    }

    /// Message reported by the backend, if the failure carried one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Backend { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Point-in-time view of one cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub data: Option<Value>,
    pub status: FetchStatus,
    pub error: Option<QueryError>,
    pub last_fetched_at: Option<OffsetDateTime>,
    pub subscriber_count: usize,
}

impl CacheEntry {
    pub(crate) fn empty(key: CacheKey) -> Self {
        Self {
            key,
            data: None,
            status: FetchStatus::Idle,
            error: None,
            last_fetched_at: None,
            subscriber_count: 0,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.status == FetchStatus::Stale
    }
}

/// Partial update merged into an entry by `EntityStore::upsert`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub data: Option<Value>,
    pub status: Option<FetchStatus>,
    /// `Some(None)` clears the error, `None` leaves it untouched.
    pub error: Option<Option<QueryError>>,
    pub last_fetched_at: Option<OffsetDateTime>,
}

impl EntryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn status(mut self, status: FetchStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn error(mut self, error: QueryError) -> Self {
        self.error = Some(Some(error));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.error = Some(None);
        self
    }

    pub fn fetched_at(mut self, at: OffsetDateTime) -> Self {
        self.last_fetched_at = Some(at);
        self
    }

    /// Patch applied when a fetch succeeds.
    pub fn success(data: Value, at: OffsetDateTime) -> Self {
        Self::new()
            .data(data)
            .status(FetchStatus::Success)
            .clear_error()
            .fetched_at(at)
    }

    pub(crate) fn apply(self, entry: &mut CacheEntry) {
        if let Some(data) = self.data {
            entry.data = Some(data);
        }
        if let Some(status) = self.status {
            entry.status = status;
        }
        if let Some(error) = self.error {
            entry.error = error;
        }
        if let Some(at) = self.last_fetched_at {
            entry.last_fetched_at = Some(at);
        }
    }
}

/// What happened to a fetch result handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result was applied to the entry.
    Applied,
    /// The failure was recorded on the entry.
    Failed,
    /// A newer fetch was issued (or the entry is gone); the result was dropped.
    Superseded,
}

impl FetchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Failed => "failed",
            Self::Superseded => "superseded",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cache_key;

    #[test]
    fn patch_merges_only_present_fields() {
        let mut entry = CacheEntry::empty(cache_key!["orders"]);
        EntryPatch::new()
            .data(json!([1, 2]))
            .status(FetchStatus::Success)
            .apply(&mut entry);

        EntryPatch::new()
            .status(FetchStatus::Error)
            .error(QueryError::Timeout)
            .apply(&mut entry);

        assert_eq!(entry.data, Some(json!([1, 2])));
        assert_eq!(entry.status, FetchStatus::Error);
        assert_eq!(entry.error, Some(QueryError::Timeout));

        EntryPatch::new().clear_error().apply(&mut entry);
        assert_eq!(entry.error, None);
    }

    #[test]
    fn backend_error_display_includes_message() {
        let err = QueryError::backend(422, Some("name already taken".into()));
        assert_eq!(
            err.to_string(),
            "backend returned status 422: name already taken"
        );
        assert_eq!(err.backend_message(), Some("name already taken"));

        let bare = QueryError::backend(500, None);
        assert_eq!(bare.to_string(), "backend returned status 500");
        assert_eq!(bare.status(), Some(500));
    }

    #[test]
    fn status_helpers() {
        assert!(FetchStatus::Stale.needs_fetch());
        assert!(FetchStatus::Idle.needs_fetch());
        assert!(!FetchStatus::Success.needs_fetch());
        assert!(!FetchStatus::Loading.needs_fetch());
        assert!(FetchStatus::Error.is_settled());
        assert!(!FetchStatus::Stale.is_settled());
    }
}
