use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Store-wide settings edited from the settings screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsRecord {
    pub store_name: String,
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: Option<String>,
    pub currency: String,
    #[serde(default)]
    pub minimum_order: f64,
    #[serde(default)]
    pub maintenance_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdateRequest {
    pub store_name: String,
    pub contact_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    pub currency: String,
    pub minimum_order: f64,
    pub maintenance_mode: bool,
}

impl From<SettingsRecord> for SettingsUpdateRequest {
    fn from(record: SettingsRecord) -> Self {
        Self {
            store_name: record.store_name,
            contact_email: record.contact_email,
            contact_phone: record.contact_phone,
            currency: record.currency,
            minimum_order: record.minimum_order,
            maintenance_mode: record.maintenance_mode,
        }
    }
}

/// CMS page such as terms of service or FAQ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub slug: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub published: bool,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageUpdateRequest {
    pub title: String,
    pub body: String,
    pub published: bool,
}
