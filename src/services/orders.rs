//! Checkout, order lookups and admin order processing.

use crate::backend::CacheBackend;
use crate::cache::CacheService;
use crate::error::{Error, Result};
use crate::invalidation::Invalidation;
use crate::key::CacheKey;
use crate::models::{NewOrder, Order, OrderItem};
use crate::repository::{DataRepository, Datastore, OrderRepository, ProductRepository};
use uuid::Uuid;

/// Decrement each line item's product stock by its quantity.
///
/// Items are applied one at a time. A missing product stops the loop with
/// `NotFound`; decrements already applied stay. Stock may go negative.
///
/// # Errors
///
/// `Error::NotFound` for an unknown product, or a store error.
pub async fn reduce_stock<P: ProductRepository>(products: &P, items: &[OrderItem]) -> Result<()> {
    for item in items {
        let stock = products
            .adjust_stock(item.product_id, -item.quantity)
            .await?
            .ok_or_else(|| Error::not_found("Product Not Found"))?;

        if stock < 0 {
            warn!(
                "[Orders] Product {} oversold, stock is now {}",
                item.product_id, stock
            );
        }
    }
    Ok(())
}

fn validate(order: &NewOrder) -> Result<()> {
    if !order.shipping_info.is_complete()
        || order.user.trim().is_empty()
        || order.order_items.is_empty()
    {
        return Err(Error::validation("Please Enter all Fields"));
    }
    Ok(())
}

pub struct OrderService<D: Datastore, B: CacheBackend> {
    store: D,
    cache: CacheService<B>,
}

impl<D: Datastore, B: CacheBackend> Clone for OrderService<D, B> {
    fn clone(&self) -> Self {
        OrderService {
            store: self.store.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<D: Datastore, B: CacheBackend> OrderService<D, B> {
    pub fn new(store: D, cache: CacheService<B>) -> Self {
        Self { store, cache }
    }

    /// Place an order and take its items out of stock.
    pub async fn place(&self, draft: NewOrder) -> Result<Order> {
        validate(&draft)?;

        let order = self.store.orders().save(Order::new(draft)).await?;
        info!(
            "[Orders] Order {} placed by {} ({} items)",
            order.id,
            order.user,
            order.order_items.len()
        );

        // Decrements applied before a failure stay in the store.
        let reduced = reduce_stock(self.store.products(), &order.order_items).await;

        self.cache
            .invalidate(
                &Invalidation::new()
                    .products()
                    .order()
                    .admin()
                    .user_id(order.user.clone())
                    .product_id(order.product_ids()),
            )
            .await?;

        reduced?;
        Ok(order)
    }

    /// Orders placed by one user.
    pub async fn my_orders(&self, user: &str) -> Result<Vec<Order>> {
        self.cache
            .fetch_or_load(&CacheKey::MyOrders(user.to_string()), || {
                self.store.orders().by_user(user)
            })
            .await
    }

    pub async fn all_orders(&self) -> Result<Vec<Order>> {
        self.cache
            .fetch_or_load(&CacheKey::AllOrders, || self.store.orders().fetch_all())
            .await
    }

    pub async fn order(&self, id: Uuid) -> Result<Order> {
        self.cache
            .fetch_or_load(&CacheKey::Order(id), || async move {
                self.find(id).await
            })
            .await
    }

    /// Advance an order's status by one step.
    pub async fn process(&self, id: Uuid) -> Result<Order> {
        let mut order = self.find(id).await?;
        let previous = order.status;
        order.status = previous.advance();
        order.updated_at = chrono::Utc::now();

        let order = self.store.orders().save(order).await?;
        info!(
            "[Orders] Order {} moved from {:?} to {:?}",
            id, previous, order.status
        );

        self.cache
            .invalidate(
                &Invalidation::new()
                    .order()
                    .admin()
                    .user_id(order.user.clone())
                    .order_id(id),
            )
            .await?;

        Ok(order)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let order = self.find(id).await?;
        self.store.orders().remove(&id).await?;
        info!("[Orders] Order {} deleted", id);

        self.cache
            .invalidate(
                &Invalidation::new()
                    .order()
                    .admin()
                    .user_id(order.user)
                    .order_id(id),
            )
            .await?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Order> {
        self.store
            .orders()
            .fetch_by_id(&id)
            .await?
            .ok_or_else(|| Error::not_found("Order Not Found"))
    }
}
