use super::auth::Caller;
use super::{message, parse_id, AdminUser, AppState};
use crate::backend::CacheBackend;
use crate::error::{Error, Result};
use crate::media::MediaStore;
use crate::models::NewOrder;
use crate::repository::Datastore;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

/// Parse a checkout body. Missing or mistyped fields are a validation error.
pub(crate) fn parse_new_order(body: &[u8]) -> Result<NewOrder> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("Rejected order body: {}", e);
        Error::validation("Please Enter all Fields")
    })
}

async fn place<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let draft = parse_new_order(&body)?;
    state.orders.place(draft).await?;
    Ok((StatusCode::CREATED, message("Order Placed Successfully")))
}

async fn my_orders<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    Query(caller): Query<Caller>,
) -> Result<impl IntoResponse> {
    let user = caller
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::validation("Please provide user id"))?;

    let orders = state.orders.my_orders(&user).await?;
    Ok(Json(json!({ "success": true, "orders": orders })))
}

async fn all_orders<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    AdminUser(_): AdminUser,
) -> Result<impl IntoResponse> {
    let orders = state.orders.all_orders().await?;
    Ok(Json(json!({ "success": true, "orders": orders })))
}

async fn single<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let order = state.orders.order(parse_id(&id)?).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

async fn process<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.orders.process(parse_id(&id)?).await?;
    Ok(message("Order Processed Successfully"))
}

async fn remove<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.orders.delete(parse_id(&id)?).await?;
    Ok(message("Order Deleted Successfully"))
}

pub(crate) fn routes<D, B, M>() -> Router<AppState<D, B, M>>
where
    D: Datastore,
    B: CacheBackend,
    M: MediaStore,
{
    Router::new()
        .route("/new", post(place::<D, B, M>))
        .route("/my", get(my_orders::<D, B, M>))
        .route("/all", get(all_orders::<D, B, M>))
        .route(
            "/{id}",
            get(single::<D, B, M>)
                .put(process::<D, B, M>)
                .delete(remove::<D, B, M>),
        )
}
