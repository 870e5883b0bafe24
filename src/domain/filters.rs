//! Client-side filters and sorts applied to fetched lists.

use std::cmp::Ordering;

use loumo_api_types::{Category, Client, Delivery, DeliveryStatus, Id, Order, OrderStatus, Product};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSort {
    #[default]
    Newest,
    Oldest,
    /// Highest total first.
    Total,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub search: Option<String>,
    pub sort: OrderSort,
}

impl OrderFilter {
    pub fn apply(&self, orders: Vec<Order>) -> Vec<Order> {
        let needle = normalized(self.search.as_deref());
        let mut matched: Vec<Order> = orders
            .into_iter()
            .filter(|order| self.status.is_none_or(|status| order.status == status))
            .filter(|order| {
                needle.as_deref().is_none_or(|needle| {
                    contains(&order.reference, needle)
                        || order
                            .client_name
                            .as_deref()
                            .is_some_and(|name| contains(name, needle))
                        || order.id.to_string() == needle
                })
            })
            .collect();

        match self.sort {
            OrderSort::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            OrderSort::Oldest => matched.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            OrderSort::Total => matched.sort_by(|a, b| {
                b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal)
            }),
        }
        matched
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_id: Option<Id>,
    pub search: Option<String>,
    pub published: Option<bool>,
}

impl ProductFilter {
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        let needle = normalized(self.search.as_deref());
        products
            .into_iter()
            .filter(|product| self.category_id.is_none_or(|id| product.category_id == id))
            .filter(|product| self.published.is_none_or(|flag| product.published == flag))
            .filter(|product| {
                needle.as_deref().is_none_or(|needle| {
                    contains(&product.name, needle)
                        || product.variants.iter().any(|variant| {
                            variant
                                .sku
                                .as_deref()
                                .is_some_and(|sku| contains(sku, needle))
                        })
                })
            })
            .collect()
    }
}

pub fn filter_categories(categories: Vec<Category>, search: Option<&str>) -> Vec<Category> {
    let Some(needle) = normalized(search) else {
        return categories;
    };
    categories
        .into_iter()
        .filter(|category| contains(&category.name, &needle))
        .collect()
}

pub fn filter_clients(clients: Vec<Client>, search: Option<&str>) -> Vec<Client> {
    let Some(needle) = normalized(search) else {
        return clients;
    };
    clients
        .into_iter()
        .filter(|client| {
            contains(&client.full_name, &needle)
                || contains(&client.email, &needle)
                || client
                    .phone
                    .as_deref()
                    .is_some_and(|phone| contains(phone, &needle))
        })
        .collect()
}

pub fn filter_deliveries(deliveries: Vec<Delivery>, status: Option<DeliveryStatus>) -> Vec<Delivery> {
    match status {
        Some(status) => deliveries
            .into_iter()
            .filter(|delivery| delivery.status == status)
            .collect(),
        None => deliveries,
    }
}

fn normalized(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
}

fn contains(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}
