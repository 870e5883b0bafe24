//! Cache key definitions.
//!
//! A `CacheKey` is an ordered list of segments. Keys compare structurally and a
//! key is a member of every family whose prefix it starts with, so
//! `["products", 12]` belongs to the `["products"]` family.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One primitive component of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySegment {
    Num(i64),
    Str(String),
}

impl From<&str> for KeySegment {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for KeySegment {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for KeySegment {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<i64> for KeySegment {
    fn from(value: i64) -> Self {
        Self::Num(value)
    }
}

impl From<i32> for KeySegment {
    fn from(value: i32) -> Self {
        Self::Num(i64::from(value))
    }
}

impl From<u32> for KeySegment {
    fn from(value: u32) -> Self {
        Self::Num(i64::from(value))
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value:?}"),
        }
    }
}

/// Structured identifier for a cached collection or item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CacheKey(Vec<KeySegment>);

impl CacheKey {
    pub fn from_segments(segments: Vec<KeySegment>) -> Self {
        Self(segments)
    }

    /// Single-segment key naming a collection, e.g. `["orders"]`.
    pub fn root(name: &str) -> Self {
        Self(vec![KeySegment::from(name)])
    }

    /// Returns a new key with `segment` appended.
    pub fn child(&self, segment: impl Into<KeySegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when this key belongs to the family denoted by `prefix`.
    ///
    /// The empty key is a prefix of every key.
    pub fn starts_with(&self, prefix: &CacheKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, segment) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{segment}")?;
        }
        f.write_str("]")
    }
}

/// Build a [`CacheKey`] from a list of segment values.
///
/// ```ignore
/// let key = cache_key!["products", 12];
/// ```
#[macro_export]
macro_rules! cache_key {
    ($($segment:expr),* $(,)?) => {
        $crate::cache::CacheKey::from_segments(vec![
            $($crate::cache::KeySegment::from($segment)),*
        ])
    };
}

/// Back-office resource families.
///
/// Each family owns the root key of its collection; item keys hang below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
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

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Categories,
        EntityKind::Products,
        EntityKind::Orders,
        EntityKind::Deliveries,
        EntityKind::Agents,
        EntityKind::Zones,
        EntityKind::Clients,
        EntityKind::Settings,
        EntityKind::Pages,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Products => "products",
            Self::Orders => "orders",
            Self::Deliveries => "deliveries",
            Self::Agents => "agents",
            Self::Zones => "zones",
            Self::Clients => "clients",
            Self::Settings => "settings",
            Self::Pages => "pages",
        }
    }

    /// Collection key, e.g. `["orders"]`.
    pub fn root(self) -> CacheKey {
        CacheKey::root(self.as_str())
    }

    /// Item key, e.g. `["products", 12]`.
    pub fn item(self, id: impl Into<KeySegment>) -> CacheKey {
        self.root().child(id)
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
