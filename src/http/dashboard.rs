//! Admin dashboard endpoints. All of them require an admin caller.

use super::{AdminUser, AppState};
use crate::backend::CacheBackend;
use crate::error::Result;
use crate::media::MediaStore;
use crate::repository::Datastore;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

async fn stats<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    AdminUser(_): AdminUser,
) -> Result<impl IntoResponse> {
    let stats = state.dashboard.stats().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

async fn pie<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    AdminUser(_): AdminUser,
) -> Result<impl IntoResponse> {
    let charts = state.dashboard.pie_charts().await?;
    Ok(Json(json!({ "success": true, "charts": charts })))
}

async fn bar<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    AdminUser(_): AdminUser,
) -> Result<impl IntoResponse> {
    let charts = state.dashboard.bar_charts().await?;
    Ok(Json(json!({ "success": true, "charts": charts })))
}

async fn line<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    AdminUser(_): AdminUser,
) -> Result<impl IntoResponse> {
    let charts = state.dashboard.line_charts().await?;
    Ok(Json(json!({ "success": true, "charts": charts })))
}

pub(crate) fn routes<D, B, M>() -> Router<AppState<D, B, M>>
where
    D: Datastore,
    B: CacheBackend,
    M: MediaStore,
{
    Router::new()
        .route("/stats", get(stats::<D, B, M>))
        .route("/pie", get(pie::<D, B, M>))
        .route("/bar", get(bar::<D, B, M>))
        .route("/line", get(line::<D, B, M>))
}
