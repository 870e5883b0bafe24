//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::Path,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::*;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "loumo-admin";
const ENV_PREFIX: &str = "LOUMO";
const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000/api/";
const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
const DEFAULT_RETRY_COUNT: u32 = 1;
const DEFAULT_MAX_IDLE_ENTRIES: u64 = 500;
const DEFAULT_EVENT_LOG_LIMIT: u64 = 1_024;
const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 30 * 60;
const DEFAULT_SESSION_CHECK_INTERVAL_SECS: u64 = 30;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub backend: BackendSettings,
    pub logging: LoggingSettings,
    pub query: QuerySettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Base URL every REST path is joined onto; always ends with `/`.
    pub base_url: Url,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub retry_delay: Duration,
    pub retry_count: u32,
    pub refetch_interval: Option<Duration>,
    pub refetch_on_window_focus: bool,
    pub max_idle_entries: NonZeroUsize,
    pub event_log_limit: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub idle_timeout: Duration,
    pub check_interval: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut raw = load_raw(cli.config_file.as_deref())?;
    raw.apply_overrides(&cli.overrides);
    Settings::from_raw(raw)
}

fn load_raw(config_file: Option<&Path>) -> Result<RawSettings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    Ok(builder.build()?.try_deserialize()?)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    backend: RawBackendSettings,
    logging: RawLoggingSettings,
    query: RawQuerySettings,
    session: RawSessionSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(url) = overrides.backend_url.as_ref() {
            self.backend.base_url = Some(url.clone());
        }
        if let Some(timeout) = overrides.backend_timeout_ms {
            self.backend.timeout_ms = Some(timeout);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            backend,
            logging,
            query,
            session,
        } = raw;

        Ok(Self {
            backend: build_backend_settings(backend)?,
            logging: build_logging_settings(logging)?,
            query: build_query_settings(query)?,
            session: build_session_settings(session)?,
        })
    }
}

fn build_backend_settings(backend: RawBackendSettings) -> Result<BackendSettings, LoadError> {
    let raw_url = backend
        .base_url
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        return Err(LoadError::invalid("backend.base_url", "must not be empty"));
    }

    // Joining relative paths only keeps the last segment when the base ends with `/`.
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let base_url = Url::parse(&normalized)
        .map_err(|err| LoadError::invalid("backend.base_url", format!("invalid URL: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "backend.base_url",
            "scheme must be http or https",
        ));
    }

    let api_token = backend.api_token.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let timeout_ms = backend.timeout_ms.unwrap_or(DEFAULT_BACKEND_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(LoadError::invalid(
            "backend.timeout_ms",
            "must be greater than zero",
        ));
    }

    Ok(BackendSettings {
        base_url,
        api_token,
        timeout: Duration::from_millis(timeout_ms),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_query_settings(query: RawQuerySettings) -> Result<QuerySettings, LoadError> {
    let retry_delay_ms = query.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS);
    let retry_count = query.retry_count.unwrap_or(DEFAULT_RETRY_COUNT);
    let refetch_interval = query
        .refetch_interval_ms
        .filter(|millis| *millis > 0)
        .map(Duration::from_millis);

    let max_idle_entries = non_zero_usize(
        query.max_idle_entries.unwrap_or(DEFAULT_MAX_IDLE_ENTRIES),
        "query.max_idle_entries",
    )?;
    let event_log_limit = non_zero_usize(
        query.event_log_limit.unwrap_or(DEFAULT_EVENT_LOG_LIMIT),
        "query.event_log_limit",
    )?;

    Ok(QuerySettings {
        retry_delay: Duration::from_millis(retry_delay_ms),
        retry_count,
        refetch_interval,
        refetch_on_window_focus: query.refetch_on_window_focus.unwrap_or(true),
        max_idle_entries,
        event_log_limit,
    })
}

fn build_session_settings(session: RawSessionSettings) -> Result<SessionSettings, LoadError> {
    let idle_timeout = non_zero_u32(
        session
            .idle_timeout_secs
            .unwrap_or(DEFAULT_SESSION_IDLE_TIMEOUT_SECS),
        "session.idle_timeout_secs",
    )?;
    let check_interval = non_zero_u32(
        session
            .check_interval_secs
            .unwrap_or(DEFAULT_SESSION_CHECK_INTERVAL_SECS),
        "session.check_interval_secs",
    )?;

    Ok(SessionSettings {
        idle_timeout: Duration::from_secs(idle_timeout.get().into()),
        check_interval: Duration::from_secs(check_interval.get().into()),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBackendSettings {
    base_url: Option<String>,
    api_token: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawQuerySettings {
    retry_delay_ms: Option<u64>,
    retry_count: Option<u32>,
    refetch_interval_ms: Option<u64>,
    refetch_on_window_focus: Option<bool>,
    max_idle_entries: Option<u64>,
    event_log_limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSessionSettings {
    idle_timeout_secs: Option<u64>,
    check_interval_secs: Option<u64>,
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }

    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
