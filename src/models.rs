//! Catalog, order and user records.
//!
//! These are the shapes stored in the repositories and snapshotted into the
//! cache. Wire names are camelCase to match the JSON API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored media asset: the media store's id plus its public URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub stock: i64,
    /// Always lowercase.
    pub category: String,
    pub photos: Vec<Photo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a new product with an auto-generated UUIDv7.
    pub fn new(draft: NewProduct, photos: Vec<Photo>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: draft.name,
            price: draft.price,
            stock: draft.stock,
            category: draft.category.to_lowercase(),
            photos,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the fields present in `patch`, normalizing the category.
    pub fn apply(&mut self, patch: ProductPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(category) = patch.category {
            self.category = category.to_lowercase();
        }
        self.updated_at = Utc::now();
    }

    pub fn photo_ids(&self) -> Vec<String> {
        self.photos.iter().map(|p| p.id.clone()).collect()
    }
}

/// Validated fields of a product about to be created.
#[derive(Clone, Debug, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub category: String,
}

/// Partial update of a product; `None` leaves the field unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub category: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pin_code: u32,
}

impl ShippingInfo {
    pub fn is_complete(&self) -> bool {
        !self.address.trim().is_empty()
            && !self.city.trim().is_empty()
            && !self.state.trim().is_empty()
            && !self.country.trim().is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Status after one admin transition. `Delivered` is terminal.
    pub fn advance(self) -> Self {
        match self {
            OrderStatus::Processing => OrderStatus::Shipped,
            OrderStatus::Shipped | OrderStatus::Delivered => OrderStatus::Delivered,
        }
    }
}

/// Denormalized snapshot of a product at checkout time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub photo: String,
    pub price: f64,
    pub quantity: i64,
    pub product_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub shipping_info: ShippingInfo,
    pub user: String,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping_charges: f64,
    pub discount: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub order_items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(draft: NewOrder) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            shipping_info: draft.shipping_info,
            user: draft.user,
            subtotal: draft.subtotal,
            tax: draft.tax,
            shipping_charges: draft.shipping_charges,
            discount: draft.discount,
            total: draft.total,
            status: OrderStatus::default(),
            order_items: draft.order_items,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        self.order_items.iter().map(|i| i.product_id).collect()
    }
}

/// Checkout request body. Every field is required.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub shipping_info: ShippingInfo,
    pub user: String,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping_charges: f64,
    pub discount: f64,
    pub total: f64,
    pub order_items: Vec<OrderItem>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(draft: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: draft.id,
            name: draft.name,
            email: draft.email,
            role: draft.role.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
}
