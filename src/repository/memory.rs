//! In-memory stores.
//!
//! Each table is a `DashMap` keyed by record id behind an `Arc`, so clones
//! share data. No guard is held across an `.await`.

use super::{
    DataRepository, Datastore, OrderRepository, ProductRepository, Record, UserRepository,
};
use crate::error::Result;
use crate::models::{Order, Product, Role, User};
use crate::query::{ProductFilter, SearchPlan};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// One in-memory table of records.
pub struct MemoryTable<T: Record> {
    rows: Arc<DashMap<T::Id, T>>,
}

impl<T: Record> Clone for MemoryTable<T> {
    fn clone(&self) -> Self {
        MemoryTable {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<T: Record> Default for MemoryTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> MemoryTable<T> {
    pub fn new() -> Self {
        MemoryTable {
            rows: Arc::new(DashMap::new()),
        }
    }

    /// Insert or replace a record synchronously (fixtures and seeding).
    pub fn insert(&self, record: T) {
        self.rows.insert(record.record_id(), record);
    }

    /// Remove every record.
    pub fn clear(&self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Matching records, oldest first.
    fn collect_where(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        let mut rows: Vec<T> = self
            .rows
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|r| (r.created_at(), r.record_id()));
        rows
    }

    fn count_where(&self, keep: impl Fn(&T) -> bool) -> u64 {
        self.rows.iter().filter(|entry| keep(entry.value())).count() as u64
    }

    fn newest(&self, limit: usize) -> Vec<T> {
        let mut rows = self.collect_where(|_| true);
        rows.reverse();
        rows.truncate(limit);
        rows
    }
}

impl<T: Record> DataRepository<T> for MemoryTable<T> {
    async fn fetch_by_id(&self, id: &T::Id) -> Result<Option<T>> {
        Ok(self.rows.get(id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, record: T) -> Result<T> {
        self.rows.insert(record.record_id(), record.clone());
        Ok(record)
    }

    async fn remove(&self, id: &T::Id) -> Result<Option<T>> {
        Ok(self.rows.remove(id).map(|(_, record)| record))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.rows.len() as u64)
    }

    async fn fetch_all(&self) -> Result<Vec<T>> {
        Ok(self.collect_where(|_| true))
    }

    async fn created_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<T>> {
        Ok(self.collect_where(|r| {
            let created = r.created_at();
            created >= from && created <= to
        }))
    }
}

impl ProductRepository for MemoryTable<Product> {
    async fn latest(&self, limit: usize) -> Result<Vec<Product>> {
        Ok(self.newest(limit))
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let categories: BTreeSet<String> = self
            .rows
            .iter()
            .map(|entry| entry.value().category.clone())
            .collect();
        Ok(categories.into_iter().collect())
    }

    async fn search(&self, plan: &SearchPlan) -> Result<Vec<Product>> {
        let mut matches = self.collect_where(|p| plan.filter.matches(p));
        matches.sort_by(|a, b| plan.sort.compare(a, b));

        Ok(matches
            .into_iter()
            .skip(plan.skip)
            .take(plan.limit)
            .collect())
    }

    async fn count_matching(&self, filter: &ProductFilter) -> Result<u64> {
        Ok(self.count_where(|p| filter.matches(p)))
    }

    async fn count_out_of_stock(&self) -> Result<u64> {
        Ok(self.count_where(|p| p.stock <= 0))
    }

    async fn adjust_stock(&self, id: Uuid, delta: i64) -> Result<Option<i64>> {
        Ok(self.rows.get_mut(&id).map(|mut entry| {
            let product = entry.value_mut();
            product.stock += delta;
            product.updated_at = Utc::now();
            product.stock
        }))
    }
}

impl OrderRepository for MemoryTable<Order> {
    async fn by_user(&self, user: &str) -> Result<Vec<Order>> {
        Ok(self.collect_where(|o| o.user == user))
    }

    async fn latest(&self, limit: usize) -> Result<Vec<Order>> {
        Ok(self.newest(limit))
    }
}

impl UserRepository for MemoryTable<User> {
    async fn count_by_role(&self, role: Role) -> Result<u64> {
        Ok(self.count_where(|u| u.role == role))
    }
}

/// Process-local datastore.
#[derive(Clone, Default)]
pub struct InMemoryDatastore {
    products: MemoryTable<Product>,
    orders: MemoryTable<Order>,
    users: MemoryTable<User>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Datastore for InMemoryDatastore {
    type Products = MemoryTable<Product>;
    type Orders = MemoryTable<Order>;
    type Users = MemoryTable<User>;

    fn products(&self) -> &MemoryTable<Product> {
        &self.products
    }

    fn orders(&self) -> &MemoryTable<Order> {
        &self.orders
    }

    fn users(&self) -> &MemoryTable<User> {
        &self.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProduct;
    use crate::query::SearchQuery;
    use chrono::Duration;

    fn product(name: &str, price: f64, category: &str, age_days: i64) -> Product {
        let mut p = Product::new(
            NewProduct {
                name: name.to_string(),
                price,
                stock: 5,
                category: category.to_string(),
            },
            vec![],
        );
        p.created_at = Utc::now() - Duration::days(age_days);
        p
    }

    #[tokio::test]
    async fn test_fetch_save_remove() {
        let table = MemoryTable::<Product>::new();
        let p = product("Desk", 200.0, "furniture", 0);

        table.save(p.clone()).await.expect("Failed to save");
        assert_eq!(
            table.fetch_by_id(&p.id).await.expect("Failed to fetch"),
            Some(p.clone())
        );

        let removed = table.remove(&p.id).await.expect("Failed to remove");
        assert_eq!(removed.map(|r| r.id), Some(p.id));
        assert!(table.fetch_by_id(&p.id).await.expect("Failed to fetch").is_none());
        assert!(table.remove(&p.id).await.expect("Failed to remove").is_none());
    }

    #[tokio::test]
    async fn test_latest_is_newest_first() {
        let table = MemoryTable::<Product>::new();
        for (i, name) in ["a", "b", "c", "d", "e", "f", "g"].iter().enumerate() {
            table.insert(product(name, 1.0, "x", 10 - i as i64));
        }

        let latest: Vec<String> = ProductRepository::latest(&table, 5)
            .await
            .expect("Failed to fetch")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(latest, vec!["g", "f", "e", "d", "c"]);
    }

    #[tokio::test]
    async fn test_categories_are_distinct() {
        let table = MemoryTable::<Product>::new();
        table.insert(product("a", 1.0, "shoes", 0));
        table.insert(product("b", 1.0, "Shoes", 0));
        table.insert(product("c", 1.0, "laptops", 0));

        assert_eq!(
            table.categories().await.expect("Failed to fetch"),
            vec!["laptops".to_string(), "shoes".to_string()]
        );
        assert_eq!(table.count_in_category("shoes").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_search_pages_and_sorts() {
        let table = MemoryTable::<Product>::new();
        for i in 0..17 {
            table.insert(product(&format!("item {}", i), i as f64, "misc", 0));
        }

        let query = SearchQuery {
            sort: Some("desc".to_string()),
            page: Some("3".to_string()),
            ..Default::default()
        };
        let plan = query.plan(8).unwrap();
        let page = table.search(&plan).await.expect("Failed to search");

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].price, 0.0);
        assert_eq!(table.count_matching(&plan.filter).await.unwrap(), 17);
    }

    #[tokio::test]
    async fn test_adjust_stock_allows_negative() {
        let table = MemoryTable::<Product>::new();
        let p = product("Lamp", 30.0, "home", 0);
        table.insert(p.clone());

        assert_eq!(table.adjust_stock(p.id, -7).await.unwrap(), Some(-2));
        assert_eq!(table.count_out_of_stock().await.unwrap(), 1);
        assert_eq!(table.adjust_stock(Uuid::now_v7(), -1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_created_between() {
        let table = MemoryTable::<Product>::new();
        table.insert(product("old", 1.0, "x", 40));
        table.insert(product("new", 1.0, "x", 2));

        let now = Utc::now();
        let recent = table
            .created_between(now - Duration::days(30), now)
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].name, "new");
    }

    #[tokio::test]
    async fn test_datastore_clones_share_tables() {
        let store = InMemoryDatastore::new();
        let clone = store.clone();
        store.products().insert(product("Chair", 50.0, "furniture", 0));
        assert_eq!(clone.products().len(), 1);
    }
}
