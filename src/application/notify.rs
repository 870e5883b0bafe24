//! Fire-and-forget operator notifications.

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::lock;

const SOURCE: &str = "application::notify";
const DEFAULT_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationVariant {
    #[default]
    Default,
    Success,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: Option<String>,
    pub variant: NotificationVariant,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl Notification {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            variant: NotificationVariant::Default,
            duration: DEFAULT_DURATION,
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(title).variant(NotificationVariant::Success)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(title).variant(NotificationVariant::Destructive)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn variant(mut self, variant: NotificationVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().try_into().unwrap_or(u64::MAX))
    }
}

/// Sink for operator-facing messages. Delivery is never awaited.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the tracing pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let description = notification.description.as_deref().unwrap_or_default();
        match notification.variant {
            NotificationVariant::Destructive => {
                warn!(title = %notification.title, description, "Operator notification")
            }
            NotificationVariant::Default | NotificationVariant::Success => {
                info!(title = %notification.title, description, "Operator notification")
            }
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        lock::lock(&self.entries, SOURCE, "notifications").clone()
    }

    pub fn len(&self) -> usize {
        lock::lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock::lock(&self.entries, SOURCE, "clear").clear();
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        lock::lock(&self.entries, SOURCE, "notify").push(notification);
    }
}
