//! Query cache configuration.
//!
//! Controls the default refetch policy, idle-entry eviction and the event
//! journal via the `[query]` section of `loumo-admin.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

// Default values for query configuration
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
const DEFAULT_RETRY_COUNT: u32 = 1;
const DEFAULT_MAX_IDLE_ENTRIES: usize = 500;
const DEFAULT_EVENT_LOG_LIMIT: usize = 1024;

/// Refetch behaviour attached to a mounted query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefetchPolicy {
    /// Refetch active entries when the operator window regains focus.
    pub on_window_focus: bool,
    /// Refetch periodically while mounted.
    pub interval: Option<Duration>,
    /// Delay before a failed fetch is retried.
    pub retry_delay: Duration,
    /// Retries allowed after a failure before the entry stays in error.
    pub retry_count: u32,
}

impl Default for RefetchPolicy {
    fn default() -> Self {
        Self {
            on_window_focus: true,
            interval: None,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            retry_count: DEFAULT_RETRY_COUNT,
        }
    }
}

impl RefetchPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn without_window_focus(mut self) -> Self {
        self.on_window_focus = false;
        self
    }

    pub fn with_retry(mut self, retry_count: u32, retry_delay: Duration) -> Self {
        self.retry_count = retry_count;
        self.retry_delay = retry_delay;
        self
    }
}

/// Query cache configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Delay (ms) before the retry of a failed fetch.
    pub retry_delay_ms: u64,
    /// Number of automatic retries after a failed fetch.
    pub retry_count: u32,
    /// Periodic refetch interval (ms) for mounted queries; 0 disables it.
    pub refetch_interval_ms: u64,
    /// Refetch active queries when the window regains focus.
    pub refetch_on_window_focus: bool,
    /// Maximum unsubscribed entries kept before LRU eviction.
    pub max_idle_entries: usize,
    /// Maximum events retained by the journal.
    pub event_log_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            retry_count: DEFAULT_RETRY_COUNT,
            refetch_interval_ms: 0,
            refetch_on_window_focus: true,
            max_idle_entries: DEFAULT_MAX_IDLE_ENTRIES,
            event_log_limit: DEFAULT_EVENT_LOG_LIMIT,
        }
    }
}

impl From<&crate::config::QuerySettings> for QueryConfig {
    fn from(settings: &crate::config::QuerySettings) -> Self {
        Self {
            retry_delay_ms: u64::try_from(settings.retry_delay.as_millis()).unwrap_or(u64::MAX),
            retry_count: settings.retry_count,
            refetch_interval_ms: settings
                .refetch_interval
                .map(|interval| u64::try_from(interval.as_millis()).unwrap_or(u64::MAX))
                .unwrap_or(0),
            refetch_on_window_focus: settings.refetch_on_window_focus,
            max_idle_entries: settings.max_idle_entries.get(),
            event_log_limit: settings.event_log_limit.get(),
        }
    }
}

impl QueryConfig {
    /// Policy applied to queries that do not override it.
    pub fn default_policy(&self) -> RefetchPolicy {
        RefetchPolicy {
            on_window_focus: self.refetch_on_window_focus,
            interval: (self.refetch_interval_ms > 0)
                .then(|| Duration::from_millis(self.refetch_interval_ms)),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            retry_count: self.retry_count,
        }
    }

    /// Returns the idle-entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn max_idle_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_idle_entries).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the journal limit, clamping to 1 if zero.
    pub fn event_log_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.event_log_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
