use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every metric the cache emits.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "loumo_query_fetch_total",
            Unit::Count,
            "Completed fetches, labelled by outcome (applied, failed, superseded)."
        );
        describe_histogram!(
            "loumo_query_fetch_ms",
            Unit::Milliseconds,
            "Fetch latency in milliseconds."
        );
        describe_counter!(
            "loumo_query_superseded_total",
            Unit::Count,
            "Fetch results discarded because a newer fetch was issued."
        );
        describe_counter!(
            "loumo_cache_invalidated_total",
            Unit::Count,
            "Invalidation requests, labelled by scope."
        );
        describe_counter!(
            "loumo_cache_evict_total",
            Unit::Count,
            "Idle cache entries evicted due to capacity."
        );
        describe_gauge!(
            "loumo_cache_entries",
            Unit::Count,
            "Current number of cache entries."
        );
        describe_counter!(
            "loumo_mutation_total",
            Unit::Count,
            "Mutation calls, labelled by outcome (success, error, busy)."
        );
        describe_counter!(
            "loumo_cache_event_dropped_total",
            Unit::Count,
            "Journal events dropped because the journal was full."
        );
    });
}
