//! Cache invalidation policy.
//!
//! A write describes what it touched with an [`Invalidation`]; the policy
//! turns that into the exact set of keys to delete:
//!
//! | Flag       | Keys deleted                                              |
//! |------------|-----------------------------------------------------------|
//! | `products` | `latest-products`, `categories`, `all-products`, `product-{id}` per id |
//! | `order`    | `all-orders`, `my-orders-{user}`, `order-{id}`            |
//! | `admin`    | `admin-stats`, `admin-pie-charts`, `admin-bar-charts`, `admin-line-charts` |
//!
//! Flags are independent and combine freely. The result is a set, so deleting
//! it is idempotent and order does not matter.
//!
//! ```
//! use shop_kit::invalidation::Invalidation;
//!
//! let keys = Invalidation::new().products().admin().keys();
//! assert!(keys.contains("all-products"));
//! assert!(keys.contains("admin-stats"));
//! assert_eq!(keys.len(), 7);
//! ```

use crate::key::{CacheKey, CATALOG_KEYS, DASHBOARD_KEYS};
use std::collections::BTreeSet;
use uuid::Uuid;

/// One product id or many.
///
/// Product updates pass a single id; order placement passes every product id
/// from the order's line items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductIds {
    One(Uuid),
    Many(Vec<Uuid>),
}

impl ProductIds {
    /// Normalize to a set of ids.
    pub fn to_set(&self) -> BTreeSet<Uuid> {
        match self {
            ProductIds::One(id) => BTreeSet::from([*id]),
            ProductIds::Many(ids) => ids.iter().copied().collect(),
        }
    }
}

impl From<Uuid> for ProductIds {
    fn from(id: Uuid) -> Self {
        ProductIds::One(id)
    }
}

impl From<Vec<Uuid>> for ProductIds {
    fn from(ids: Vec<Uuid>) -> Self {
        ProductIds::Many(ids)
    }
}

/// Description of what a write touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Invalidation {
    pub products: bool,
    pub order: bool,
    pub admin: bool,
    pub product_id: Option<ProductIds>,
    pub user_id: Option<String>,
    pub order_id: Option<Uuid>,
}

impl Invalidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn products(mut self) -> Self {
        self.products = true;
        self
    }

    pub fn order(mut self) -> Self {
        self.order = true;
        self
    }

    pub fn admin(mut self) -> Self {
        self.admin = true;
        self
    }

    pub fn product_id(mut self, ids: impl Into<ProductIds>) -> Self {
        self.product_id = Some(ids.into());
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn order_id(mut self, order_id: Uuid) -> Self {
        self.order_id = Some(order_id);
        self
    }

    /// Typed keys this invalidation deletes.
    ///
    /// With `order` set, `my-orders-*` and `order-*` are only produced when the
    /// matching id was supplied; there is no placeholder key for a missing id.
    pub fn cache_keys(&self) -> BTreeSet<CacheKey> {
        let mut keys = BTreeSet::new();

        if self.products {
            keys.extend(CATALOG_KEYS.iter().cloned());
            if let Some(ids) = &self.product_id {
                keys.extend(ids.to_set().into_iter().map(CacheKey::Product));
            }
        }

        if self.order {
            keys.insert(CacheKey::AllOrders);
            if let Some(user) = &self.user_id {
                keys.insert(CacheKey::MyOrders(user.clone()));
            }
            if let Some(id) = self.order_id {
                keys.insert(CacheKey::Order(id));
            }
        }

        if self.admin {
            keys.extend(DASHBOARD_KEYS.iter().cloned());
        }

        keys
    }

    /// Rendered keys this invalidation deletes.
    pub fn keys(&self) -> BTreeSet<String> {
        self.cache_keys().iter().map(ToString::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        !self.products && !self.order && !self.admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_flag_deletes_static_catalog_keys() {
        let keys = Invalidation::new().products().keys();
        assert_eq!(
            keys,
            BTreeSet::from([
                "all-products".to_string(),
                "categories".to_string(),
                "latest-products".to_string(),
            ])
        );
    }

    #[test]
    fn test_single_product_id() {
        let id = Uuid::now_v7();
        let keys = Invalidation::new().products().product_id(id).keys();
        assert_eq!(keys.len(), 4);
        assert!(keys.contains(&format!("product-{}", id)));
    }

    #[test]
    fn test_many_product_ids_are_deduplicated() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let keys = Invalidation::new()
            .products()
            .product_id(vec![a, b, a])
            .keys();

        assert_eq!(keys.len(), 5);
        assert!(keys.contains(&format!("product-{}", a)));
        assert!(keys.contains(&format!("product-{}", b)));
    }

    #[test]
    fn test_product_ids_ignored_without_products_flag() {
        let keys = Invalidation::new().product_id(Uuid::now_v7()).keys();
        assert!(keys.is_empty());
    }

    #[test]
    fn test_order_flag_with_ids() {
        let order_id = Uuid::now_v7();
        let keys = Invalidation::new()
            .order()
            .user_id("user_7")
            .order_id(order_id)
            .keys();

        assert_eq!(
            keys,
            BTreeSet::from([
                "all-orders".to_string(),
                "my-orders-user_7".to_string(),
                format!("order-{}", order_id),
            ])
        );
    }

    #[test]
    fn test_order_flag_without_user_has_no_placeholder_key() {
        let keys = Invalidation::new().order().keys();
        assert_eq!(keys, BTreeSet::from(["all-orders".to_string()]));
        assert!(!keys.iter().any(|k| k.ends_with("undefined")));
    }

    #[test]
    fn test_admin_flag_deletes_all_dashboard_keys() {
        let keys = Invalidation::new().admin().keys();
        assert_eq!(keys.len(), 4);
        for key in [
            "admin-stats",
            "admin-pie-charts",
            "admin-bar-charts",
            "admin-line-charts",
        ] {
            assert!(keys.contains(key));
        }
    }

    #[test]
    fn test_flags_combine() {
        let product = Uuid::now_v7();
        let order = Uuid::now_v7();
        let invalidation = Invalidation::new()
            .products()
            .order()
            .admin()
            .product_id(vec![product])
            .user_id("u1")
            .order_id(order);

        // 3 catalog + 1 product + 3 order + 4 dashboard
        assert_eq!(invalidation.keys().len(), 11);
        assert!(!invalidation.is_empty());
        assert!(Invalidation::new().is_empty());
    }
}
