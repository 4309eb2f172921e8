//! HTTP surface under `/api/v1`.
//!
//! Handlers are thin: they extract, call one service method and wrap the
//! result as `{success: true, ...}`. Every failure is an
//! [`Error`](crate::error::Error), rendered by its `IntoResponse` impl.

use crate::backend::CacheBackend;
use crate::cache::CacheService;
use crate::error::{Error, Result};
use crate::media::MediaStore;
use crate::observability::CounterMetrics;
use crate::repository::Datastore;
use crate::services::{CatalogService, DashboardService, OrderService, UserService};
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod users;

pub use auth::AdminUser;

/// Largest accepted request body (five photos plus form fields).
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Shared application state.
pub struct AppState<D: Datastore, B: CacheBackend, M: MediaStore> {
    pub catalog: CatalogService<D, B, M>,
    pub orders: OrderService<D, B>,
    pub users: UserService<D, B>,
    pub dashboard: DashboardService<D, B>,
    pub cache: CacheService<B>,
    pub metrics: Arc<CounterMetrics>,
}

impl<D: Datastore, B: CacheBackend, M: MediaStore> Clone for AppState<D, B, M> {
    fn clone(&self) -> Self {
        AppState {
            catalog: self.catalog.clone(),
            orders: self.orders.clone(),
            users: self.users.clone(),
            dashboard: self.dashboard.clone(),
            cache: self.cache.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<D: Datastore, B: CacheBackend, M: MediaStore> AppState<D, B, M> {
    /// Wire every service to one store, one cache and one media store.
    pub fn new(store: D, backend: B, media: M, page_size: usize) -> Self {
        let metrics = Arc::new(CounterMetrics::new());
        let cache = CacheService::with_metrics(backend, metrics.clone());

        AppState {
            catalog: CatalogService::new(store.clone(), cache.clone(), media, page_size),
            orders: OrderService::new(store.clone(), cache.clone()),
            users: UserService::new(store.clone(), cache.clone()),
            dashboard: DashboardService::new(store, cache.clone()),
            cache,
            metrics,
        }
    }
}

/// Parse an id path segment.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| Error::validation("Invalid ID"))
}

pub(crate) fn message(text: impl Into<String>) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": text.into(),
    }))
}

async fn health<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
) -> Json<Value> {
    let cache_ok = match state.cache.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            warn!("Cache health check failed: {}", e);
            false
        }
    };

    Json(json!({
        "status": if cache_ok { "healthy" } else { "degraded" },
        "cache": {
            "healthy": cache_ok,
            "metrics": state.metrics.snapshot(),
        },
        "version": crate::VERSION,
    }))
}

/// Build the application router.
///
/// With `uploads_dir`, files stored by the local media store are served
/// under `/uploads`.
pub fn router<D, B, M>(state: AppState<D, B, M>, uploads_dir: Option<&Path>) -> Router
where
    D: Datastore,
    B: CacheBackend,
    M: MediaStore,
{
    let api = Router::new()
        .nest("/product", products::routes())
        .nest("/order", orders::routes())
        .nest("/user", users::routes())
        .nest("/dashboard", dashboard::routes());

    let mut app = Router::new()
        .route("/health", get(health::<D, B, M>))
        .nest("/api/v1", api);

    if let Some(dir) = uploads_dir {
        app = app.nest_service(crate::media::local::UPLOADS_ROUTE, ServeDir::new(dir));
    }

    app.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
