//! Data repository traits for products, orders and users.
//!
//! [`DataRepository<T>`] covers what every store offers (fetch by id, save,
//! remove, count, list, range by creation time). The per-entity traits add
//! the queries the services need on top of it. [`Datastore`] bundles the
//! three so services and handlers carry a single type parameter.
//!
//! The crate ships an in-memory implementation in [`memory`]; a database
//! implementation only has to implement these traits.
//!
//! # Error Handling
//!
//! Implementations return `Error::RepositoryError` for storage failures.
//! A missing record is `Ok(None)`, never an error.

use crate::error::Result;
use crate::models::{Order, Product, Role, User};
use crate::query::{ProductFilter, SearchPlan};
use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use uuid::Uuid;

pub mod memory;

pub use memory::{InMemoryDatastore, MemoryTable};

/// A stored record.
pub trait Record: Clone + Send + Sync + 'static {
    type Id: Clone + Eq + Ord + Hash + Display + Send + Sync + 'static;

    fn record_id(&self) -> Self::Id;

    fn created_at(&self) -> DateTime<Utc>;
}

impl Record for Product {
    type Id = Uuid;

    fn record_id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Record for Order {
    type Id = Uuid;

    fn record_id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Record for User {
    type Id = String;

    fn record_id(&self) -> String {
        self.id.clone()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Trait for data repository implementations.
///
/// Abstracts storage so services never depend on a specific database client.
pub trait DataRepository<T: Record>: Send + Sync + 'static {
    /// Fetch a record by id.
    ///
    /// # Returns
    /// - `Ok(Some(record))` - Record found
    /// - `Ok(None)` - Record not found (not an error)
    ///
    /// # Errors
    /// Returns `Err` if the data source is unavailable
    fn fetch_by_id(&self, id: &T::Id) -> impl Future<Output = Result<Option<T>>> + Send;

    /// Insert a record or replace the one with the same id.
    ///
    /// # Errors
    /// Returns `Err` if the write fails
    fn save(&self, record: T) -> impl Future<Output = Result<T>> + Send;

    /// Remove a record, returning it if it existed.
    ///
    /// # Errors
    /// Returns `Err` if the write fails
    fn remove(&self, id: &T::Id) -> impl Future<Output = Result<Option<T>>> + Send;

    /// Count all records.
    ///
    /// # Errors
    /// Returns `Err` if the data source is unavailable
    fn count(&self) -> impl Future<Output = Result<u64>> + Send;

    /// All records, oldest first.
    ///
    /// # Errors
    /// Returns `Err` if the data source is unavailable
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<T>>> + Send;

    /// Records created in `[from, to]`, oldest first.
    ///
    /// # Errors
    /// Returns `Err` if the data source is unavailable
    fn created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<T>>> + Send;
}

/// Catalog store.
pub trait ProductRepository: DataRepository<Product> {
    /// The `limit` most recently created products, newest first.
    fn latest(&self, limit: usize) -> impl Future<Output = Result<Vec<Product>>> + Send;

    /// Distinct categories, sorted.
    fn categories(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// One page of products matching a search plan.
    fn search(&self, plan: &SearchPlan) -> impl Future<Output = Result<Vec<Product>>> + Send;

    /// Number of products matching a filter, ignoring paging.
    fn count_matching(&self, filter: &ProductFilter) -> impl Future<Output = Result<u64>> + Send;

    /// Number of products in exactly `category`.
    fn count_in_category(&self, category: &str) -> impl Future<Output = Result<u64>> + Send {
        let filter = ProductFilter {
            category: Some(category.to_string()),
            ..Default::default()
        };
        async move { self.count_matching(&filter).await }
    }

    /// Number of products whose stock is zero or below.
    fn count_out_of_stock(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Add `delta` to a product's stock in one write.
    ///
    /// Returns the new stock, or `None` if the product does not exist.
    fn adjust_stock(&self, id: Uuid, delta: i64)
        -> impl Future<Output = Result<Option<i64>>> + Send;
}

/// Order store.
pub trait OrderRepository: DataRepository<Order> {
    /// Orders placed by `user`, oldest first.
    fn by_user(&self, user: &str) -> impl Future<Output = Result<Vec<Order>>> + Send;

    /// The `limit` most recent orders, newest first.
    fn latest(&self, limit: usize) -> impl Future<Output = Result<Vec<Order>>> + Send;
}

/// User store.
pub trait UserRepository: DataRepository<User> {
    fn count_by_role(&self, role: Role) -> impl Future<Output = Result<u64>> + Send;
}

/// The three stores, injected as one capability.
pub trait Datastore: Clone + Send + Sync + 'static {
    type Products: ProductRepository;
    type Orders: OrderRepository;
    type Users: UserRepository;

    fn products(&self) -> &Self::Products;

    fn orders(&self) -> &Self::Orders;

    fn users(&self) -> &Self::Users;
}
