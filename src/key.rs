//! Cache key management.
//!
//! Every key the backend ever sees is produced here. Static keys are fixed
//! strings; dynamic keys embed an entity id (`product-{id}`, `order-{id}`,
//! `my-orders-{user}`).

use std::fmt;
use uuid::Uuid;

/// Catalog keys cleared by every product write.
pub const CATALOG_KEYS: [CacheKey; 3] = [
    CacheKey::LatestProducts,
    CacheKey::Categories,
    CacheKey::AllProducts,
];

/// Dashboard keys cleared by every write that touches revenue, stock or users.
pub const DASHBOARD_KEYS: [CacheKey; 4] = [
    CacheKey::AdminStats,
    CacheKey::AdminPieCharts,
    CacheKey::AdminBarCharts,
    CacheKey::AdminLineCharts,
];

/// A cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// `latest-products`
    LatestProducts,
    /// `categories`
    Categories,
    /// `all-products`
    AllProducts,
    /// `product-{id}`
    Product(Uuid),

    /// `admin-stats`
    AdminStats,
    /// `admin-pie-charts`
    AdminPieCharts,
    /// `admin-bar-charts`
    AdminBarCharts,
    /// `admin-line-charts`
    AdminLineCharts,

    /// `all-orders`
    AllOrders,
    /// `my-orders-{user}`
    MyOrders(String),
    /// `order-{id}`
    Order(Uuid),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::LatestProducts => f.write_str("latest-products"),
            CacheKey::Categories => f.write_str("categories"),
            CacheKey::AllProducts => f.write_str("all-products"),
            CacheKey::Product(id) => write!(f, "product-{}", id),
            CacheKey::AdminStats => f.write_str("admin-stats"),
            CacheKey::AdminPieCharts => f.write_str("admin-pie-charts"),
            CacheKey::AdminBarCharts => f.write_str("admin-bar-charts"),
            CacheKey::AdminLineCharts => f.write_str("admin-line-charts"),
            CacheKey::AllOrders => f.write_str("all-orders"),
            CacheKey::MyOrders(user) => write!(f, "my-orders-{}", user),
            CacheKey::Order(id) => write!(f, "order-{}", id),
        }
    }
}
