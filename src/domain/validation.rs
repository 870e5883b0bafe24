//! Form checks for every write request.
//!
//! Each `validate_*` function normalizes the request in place (trimming text,
//! dropping blank optional fields) and rejects it with
//! [`DomainError::Validation`] before the backend is contacted.

use std::path::PathBuf;

use loumo_api_types::{
    AgentRequest, CategoryRequest, ClientUpdateRequest, DeliveryAssignRequest,
    DeliveryStatusRequest, Id, OrderBulkStatusRequest, OrderStatusRequest, PageUpdateRequest,
    ProductRequest, SettingsUpdateRequest, VariantRequest, ZoneRequest,
};

use super::error::DomainError;

pub const NAME_MAX_LEN: usize = 120;
pub const DESCRIPTION_MAX_LEN: usize = 2_000;
pub const PHONE_MIN_DIGITS: usize = 8;
pub const PHONE_MAX_DIGITS: usize = 15;
pub const PAGE_TITLE_MAX_LEN: usize = 200;

pub fn validate_category(request: &mut CategoryRequest) -> Result<(), DomainError> {
    request.name = required_text("name", &request.name, NAME_MAX_LEN)?;
    request.description = optional_text("description", request.description.take(), DESCRIPTION_MAX_LEN)?;
    if let Some(parent) = request.parent_id {
        positive_id("parent_id", parent)?;
    }
    Ok(())
}

pub fn validate_product(request: &mut ProductRequest) -> Result<(), DomainError> {
    request.name = required_text("name", &request.name, NAME_MAX_LEN)?;
    request.description = optional_text("description", request.description.take(), DESCRIPTION_MAX_LEN)?;
    positive_id("category_id", request.category_id)?;
    Ok(())
}

pub fn validate_variant(request: &mut VariantRequest) -> Result<(), DomainError> {
    request.name = required_text("name", &request.name, NAME_MAX_LEN)?;
    non_negative_amount("price", request.price)?;
    if request.stock < 0 {
        return Err(DomainError::validation("stock", "must not be negative"));
    }
    request.sku = optional_text("sku", request.sku.take(), NAME_MAX_LEN)?;
    Ok(())
}

pub fn validate_bulk_ids(ids: &[Id]) -> Result<(), DomainError> {
    if ids.is_empty() {
        return Err(DomainError::validation("ids", "select at least one item"));
    }
    for id in ids {
        positive_id("ids", *id)?;
    }
    Ok(())
}

pub fn validate_agent(request: &mut AgentRequest) -> Result<(), DomainError> {
    request.full_name = required_text("full_name", &request.full_name, NAME_MAX_LEN)?;
    request.phone = phone("phone", &request.phone)?;
    if let Some(zone) = request.zone_id {
        positive_id("zone_id", zone)?;
    }
    Ok(())
}

pub fn validate_zone(request: &mut ZoneRequest) -> Result<(), DomainError> {
    request.name = required_text("name", &request.name, NAME_MAX_LEN)?;
    non_negative_amount("delivery_fee", request.delivery_fee)?;
    Ok(())
}

pub fn validate_client(request: &mut ClientUpdateRequest) -> Result<(), DomainError> {
    request.full_name = required_text("full_name", &request.full_name, NAME_MAX_LEN)?;
    request.email = email("email", &request.email)?;
    request.phone = match request.phone.take() {
        Some(value) if !value.trim().is_empty() => Some(phone("phone", &value)?),
        _ => None,
    };
    Ok(())
}

pub fn validate_settings(request: &mut SettingsUpdateRequest) -> Result<(), DomainError> {
    request.store_name = required_text("store_name", &request.store_name, NAME_MAX_LEN)?;
    request.contact_email = email("contact_email", &request.contact_email)?;
    request.contact_phone = match request.contact_phone.take() {
        Some(value) if !value.trim().is_empty() => Some(phone("contact_phone", &value)?),
        _ => None,
    };

    let currency = request.currency.trim().to_ascii_uppercase();
    if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Err(DomainError::validation(
            "currency",
            "must be a three-letter ISO 4217 code",
        ));
    }
    request.currency = currency;

    non_negative_amount("minimum_order", request.minimum_order)?;
    Ok(())
}

pub fn validate_page(request: &mut PageUpdateRequest) -> Result<(), DomainError> {
    request.title = required_text("title", &request.title, PAGE_TITLE_MAX_LEN)?;
    if request.published && request.body.trim().is_empty() {
        return Err(DomainError::validation(
            "body",
            "a published page needs content",
        ));
    }
    Ok(())
}

/// Normalize and check a write request before it is sent.
pub trait Validate {
    fn validate(&mut self) -> Result<(), DomainError>;
}

macro_rules! validate_with {
    ($($ty:ty => $check:ident),* $(,)?) => {
        $(
            impl Validate for $ty {
                fn validate(&mut self) -> Result<(), DomainError> {
                    $check(self)
                }
            }
        )*
    };
}

validate_with! {
    CategoryRequest => validate_category,
    ProductRequest => validate_product,
    VariantRequest => validate_variant,
    AgentRequest => validate_agent,
    ZoneRequest => validate_zone,
    ClientUpdateRequest => validate_client,
    SettingsUpdateRequest => validate_settings,
    PageUpdateRequest => validate_page,
}

impl Validate for Id {
    fn validate(&mut self) -> Result<(), DomainError> {
        positive_id("id", *self)
    }
}

impl Validate for Vec<Id> {
    fn validate(&mut self) -> Result<(), DomainError> {
        validate_bulk_ids(self)
    }
}

impl Validate for OrderStatusRequest {
    fn validate(&mut self) -> Result<(), DomainError> {
        Ok(())
    }
}

impl Validate for OrderBulkStatusRequest {
    fn validate(&mut self) -> Result<(), DomainError> {
        validate_bulk_ids(&self.ids)
    }
}

impl Validate for DeliveryAssignRequest {
    fn validate(&mut self) -> Result<(), DomainError> {
        positive_id("agent_id", self.agent_id)
    }
}

impl Validate for DeliveryStatusRequest {
    fn validate(&mut self) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Image uploads must be an existing file with an image extension.
impl Validate for PathBuf {
    fn validate(&mut self) -> Result<(), DomainError> {
        if !self.is_file() {
            return Err(DomainError::validation(
                "file",
                format!("{} is not a readable file", self.display()),
            ));
        }
        let mime = mime_guess::from_path(self.as_path()).first_or_octet_stream();
        if !mime.essence_str().starts_with("image/") {
            return Err(DomainError::validation(
                "file",
                format!("expected an image, got {mime}"),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Field rules
// ============================================================================

fn required_text(field: &'static str, value: &str, max: usize) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "is required"));
    }
    if trimmed.chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

fn optional_text(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, DomainError> {
    match value {
        Some(value) if !value.trim().is_empty() => required_text(field, &value, max).map(Some),
        _ => Ok(None),
    }
}

fn positive_id(field: &'static str, id: Id) -> Result<(), DomainError> {
    if id <= 0 {
        return Err(DomainError::validation(field, "must be a positive id"));
    }
    Ok(())
}

fn non_negative_amount(field: &'static str, amount: f64) -> Result<(), DomainError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(DomainError::validation(
            field,
            "must be a non-negative amount",
        ));
    }
    Ok(())
}

fn phone(field: &'static str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if !body
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, ' ' | '-'))
    {
        return Err(DomainError::validation(
            field,
            "may only contain digits, spaces and dashes",
        ));
    }

    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits) {
        return Err(DomainError::validation(
            field,
            format!("must have between {PHONE_MIN_DIGITS} and {PHONE_MAX_DIGITS} digits"),
        ));
    }
    Ok(trimmed.to_string())
}

fn email(field: &'static str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    let valid = trimmed.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .split_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
            && !trimmed.contains(char::is_whitespace)
    });
    if !valid {
        return Err(DomainError::validation(field, "must be a valid email address"));
    }
    Ok(trimmed.to_ascii_lowercase())
}
