//! Admin dashboard views.
//!
//! Each view is computed from the stores on a miss and cached under its
//! `admin-*` key until a product, order or user write invalidates it.

use crate::backend::CacheBackend;
use crate::cache::CacheService;
use crate::charts::{calculate_percentage, get_chart_data, get_inventories, CategoryShare, ChartProperty};
use crate::error::Result;
use crate::key::CacheKey;
use crate::models::{Order, OrderStatus, Role};
use crate::repository::{
    DataRepository, Datastore, OrderRepository, ProductRepository, UserRepository,
};
use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Share of gross income attributed to marketing.
const MARKETING_SHARE: f64 = 0.30;

const LATEST_TRANSACTIONS: usize = 4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangePercent {
    pub revenue: f64,
    pub product: f64,
    pub user: f64,
    pub order: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub revenue: f64,
    pub product: u64,
    pub user: u64,
    pub order: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevenueChart {
    pub order: Vec<f64>,
    pub revenue: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub discount: f64,
    pub amount: f64,
    pub quantity: u64,
    pub status: OrderStatus,
}

impl From<&Order> for Transaction {
    fn from(order: &Order) -> Self {
        Transaction {
            id: order.id,
            discount: order.discount,
            amount: order.total,
            quantity: order.order_items.len() as u64,
            status: order.status,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub category_count: Vec<CategoryShare>,
    pub change_percent: ChangePercent,
    pub count: Totals,
    pub chart: RevenueChart,
    pub latest_transaction: Vec<Transaction>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderFulfillment {
    pub processing: u64,
    pub shipped: u64,
    pub delivered: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAvailability {
    pub in_stock: u64,
    pub out_of_stock: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueDistribution {
    pub net_margin: f64,
    pub discount: f64,
    pub production_cost: f64,
    pub burnt: f64,
    pub marketing_cost: f64,
}

impl RevenueDistribution {
    /// Production cost is shipping, burnt is tax, marketing is a fixed share
    /// of gross income; the margin is what remains.
    pub fn from_orders(orders: &[Order]) -> Self {
        let gross: f64 = orders.iter().map(|o| o.total).sum();
        let discount: f64 = orders.iter().map(|o| o.discount).sum();
        let production_cost: f64 = orders.iter().map(|o| o.shipping_charges).sum();
        let burnt: f64 = orders.iter().map(|o| o.tax).sum();
        let marketing_cost = (gross * MARKETING_SHARE).round();

        RevenueDistribution {
            net_margin: gross - discount - production_cost - burnt - marketing_cost,
            discount,
            production_cost,
            burnt,
            marketing_cost,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdminCustomer {
    pub admin: u64,
    pub customer: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieCharts {
    pub order_fulfillment: OrderFulfillment,
    pub product_categories: Vec<CategoryShare>,
    pub stock_availability: StockAvailability,
    pub revenue_distribution: RevenueDistribution,
    pub admin_customer: AdminCustomer,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarCharts {
    pub products: Vec<f64>,
    pub users: Vec<f64>,
    pub orders: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineCharts {
    pub users: Vec<f64>,
    pub products: Vec<f64>,
    pub discount: Vec<f64>,
    pub revenue: Vec<f64>,
}

/// Time ranges the dashboard queries by.
#[derive(Clone, Copy, Debug)]
struct Window {
    today: DateTime<Utc>,
    this_month_start: DateTime<Utc>,
    last_month_start: DateTime<Utc>,
    last_month_end: DateTime<Utc>,
    six_months_ago: DateTime<Utc>,
    twelve_months_ago: DateTime<Utc>,
}

fn month_start(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .unwrap_or(at)
}

impl Window {
    fn ending(today: DateTime<Utc>) -> Self {
        let this_month_start = month_start(today);
        let last_month_end = this_month_start - Duration::nanoseconds(1);
        let months_back = |n: u32| {
            today
                .checked_sub_months(Months::new(n))
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        };

        Window {
            today,
            this_month_start,
            last_month_start: month_start(last_month_end),
            last_month_end,
            six_months_ago: months_back(6),
            twelve_months_ago: months_back(12),
        }
    }
}

fn revenue(orders: &[Order]) -> f64 {
    orders.iter().map(|o| o.total).sum()
}

pub struct DashboardService<D: Datastore, B: CacheBackend> {
    store: D,
    cache: CacheService<B>,
}

impl<D: Datastore, B: CacheBackend> Clone for DashboardService<D, B> {
    fn clone(&self) -> Self {
        DashboardService {
            store: self.store.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<D: Datastore, B: CacheBackend> DashboardService<D, B> {
    pub fn new(store: D, cache: CacheService<B>) -> Self {
        Self { store, cache }
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        self.cache
            .fetch_or_load(&CacheKey::AdminStats, || self.compute_stats(Utc::now()))
            .await
    }

    pub async fn pie_charts(&self) -> Result<PieCharts> {
        self.cache
            .fetch_or_load(&CacheKey::AdminPieCharts, || self.compute_pie_charts())
            .await
    }

    pub async fn bar_charts(&self) -> Result<BarCharts> {
        self.cache
            .fetch_or_load(&CacheKey::AdminBarCharts, || {
                self.compute_bar_charts(Utc::now())
            })
            .await
    }

    pub async fn line_charts(&self) -> Result<LineCharts> {
        self.cache
            .fetch_or_load(&CacheKey::AdminLineCharts, || {
                self.compute_line_charts(Utc::now())
            })
            .await
    }

    async fn compute_stats(&self, today: DateTime<Utc>) -> Result<DashboardStats> {
        let w = Window::ending(today);
        let products = self.store.products();
        let users = self.store.users();
        let orders = self.store.orders();

        let (
            this_month_products,
            last_month_products,
            this_month_users,
            last_month_users,
            this_month_orders,
            last_month_orders,
            product_count,
            user_count,
            all_orders,
            recent_orders,
            categories,
            latest,
        ) = tokio::try_join!(
            products.created_between(w.this_month_start, w.today),
            products.created_between(w.last_month_start, w.last_month_end),
            users.created_between(w.this_month_start, w.today),
            users.created_between(w.last_month_start, w.last_month_end),
            orders.created_between(w.this_month_start, w.today),
            orders.created_between(w.last_month_start, w.last_month_end),
            products.count(),
            users.count(),
            orders.fetch_all(),
            orders.created_between(w.six_months_ago, w.today),
            products.categories(),
            OrderRepository::latest(orders, LATEST_TRANSACTIONS),
        )?;

        let category_count = get_inventories(products, &categories, product_count).await?;

        debug!(
            "[Dashboard] Stats over {} products, {} users, {} orders",
            product_count,
            user_count,
            all_orders.len()
        );

        Ok(DashboardStats {
            category_count,
            change_percent: ChangePercent {
                revenue: calculate_percentage(
                    revenue(&this_month_orders),
                    revenue(&last_month_orders),
                ),
                product: calculate_percentage(
                    this_month_products.len() as f64,
                    last_month_products.len() as f64,
                ),
                user: calculate_percentage(
                    this_month_users.len() as f64,
                    last_month_users.len() as f64,
                ),
                order: calculate_percentage(
                    this_month_orders.len() as f64,
                    last_month_orders.len() as f64,
                ),
            },
            count: Totals {
                revenue: revenue(&all_orders),
                product: product_count,
                user: user_count,
                order: all_orders.len() as u64,
            },
            chart: RevenueChart {
                order: get_chart_data(6, &recent_orders, w.today, None),
                revenue: get_chart_data(6, &recent_orders, w.today, Some(ChartProperty::Total)),
            },
            latest_transaction: latest.iter().map(Transaction::from).collect(),
        })
    }

    async fn compute_pie_charts(&self) -> Result<PieCharts> {
        let products = self.store.products();
        let users = self.store.users();

        let (all_orders, categories, product_count, out_of_stock, admins, customers) = tokio::try_join!(
            self.store.orders().fetch_all(),
            products.categories(),
            products.count(),
            products.count_out_of_stock(),
            users.count_by_role(Role::Admin),
            users.count_by_role(Role::User),
        )?;

        let product_categories = get_inventories(products, &categories, product_count).await?;

        let with_status =
            |status: OrderStatus| all_orders.iter().filter(|o| o.status == status).count() as u64;

        Ok(PieCharts {
            order_fulfillment: OrderFulfillment {
                processing: with_status(OrderStatus::Processing),
                shipped: with_status(OrderStatus::Shipped),
                delivered: with_status(OrderStatus::Delivered),
            },
            product_categories,
            stock_availability: StockAvailability {
                in_stock: product_count.saturating_sub(out_of_stock),
                out_of_stock,
            },
            revenue_distribution: RevenueDistribution::from_orders(&all_orders),
            admin_customer: AdminCustomer {
                admin: admins,
                customer: customers,
            },
        })
    }

    async fn compute_bar_charts(&self, today: DateTime<Utc>) -> Result<BarCharts> {
        let w = Window::ending(today);

        let (products, users, orders) = tokio::try_join!(
            self.store
                .products()
                .created_between(w.six_months_ago, w.today),
            self.store.users().created_between(w.six_months_ago, w.today),
            self.store
                .orders()
                .created_between(w.twelve_months_ago, w.today),
        )?;

        Ok(BarCharts {
            products: get_chart_data(6, &products, w.today, None),
            users: get_chart_data(6, &users, w.today, None),
            orders: get_chart_data(12, &orders, w.today, None),
        })
    }

    async fn compute_line_charts(&self, today: DateTime<Utc>) -> Result<LineCharts> {
        let w = Window::ending(today);

        let (users, products, orders) = tokio::try_join!(
            self.store
                .users()
                .created_between(w.twelve_months_ago, w.today),
            self.store
                .products()
                .created_between(w.twelve_months_ago, w.today),
            self.store
                .orders()
                .created_between(w.twelve_months_ago, w.today),
        )?;

        Ok(LineCharts {
            users: get_chart_data(12, &users, w.today, None),
            products: get_chart_data(12, &products, w.today, None),
            discount: get_chart_data(12, &orders, w.today, Some(ChartProperty::Discount)),
            revenue: get_chart_data(12, &orders, w.today, Some(ChartProperty::Total)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_month_bounds() {
        let today = Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).unwrap();
        let w = Window::ending(today);

        assert_eq!(
            w.this_month_start,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            w.last_month_start,
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
        );
        assert!(w.last_month_end < w.this_month_start);
        assert_eq!(w.last_month_end.month(), 2);
        assert_eq!(
            w.six_months_ago,
            Utc.with_ymd_and_hms(2023, 9, 10, 15, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_revenue_distribution() {
        let order = |total: f64, discount: f64, shipping: f64, tax: f64| {
            Order::new(crate::models::NewOrder {
                shipping_info: crate::models::ShippingInfo {
                    address: "a".to_string(),
                    city: "c".to_string(),
                    state: "s".to_string(),
                    country: "in".to_string(),
                    pin_code: 1,
                },
                user: "u1".to_string(),
                subtotal: total,
                tax,
                shipping_charges: shipping,
                discount,
                total,
                order_items: vec![],
            })
        };

        let dist = RevenueDistribution::from_orders(&[
            order(1000.0, 100.0, 50.0, 180.0),
            order(500.0, 0.0, 0.0, 90.0),
        ]);

        assert_eq!(dist.marketing_cost, 450.0);
        assert_eq!(dist.discount, 100.0);
        assert_eq!(dist.production_cost, 50.0);
        assert_eq!(dist.burnt, 270.0);
        assert_eq!(dist.net_margin, 1500.0 - 100.0 - 50.0 - 270.0 - 450.0);
        assert_eq!(RevenueDistribution::from_orders(&[]).net_margin, 0.0);
    }

    #[test]
    fn test_window_in_january() {
        let today = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        let w = Window::ending(today);
        assert_eq!(
            w.last_month_start,
            Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap()
        );
    }
}
