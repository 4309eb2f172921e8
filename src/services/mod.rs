//! Service layer: business rules and cache coordination.
//!
//! Handlers stay thin and call into these services; services read through the
//! cache, write to the stores, talk to the media store and issue the matching
//! invalidations.

pub mod catalog;
pub mod dashboard;
pub mod orders;
pub mod users;

pub use catalog::{CatalogService, ProductForm};
pub use dashboard::DashboardService;
pub use orders::{reduce_stock, OrderService};
pub use users::UserService;
