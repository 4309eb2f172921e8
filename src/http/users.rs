use super::{message, AdminUser, AppState};
use crate::backend::CacheBackend;
use crate::error::{Error, Result};
use crate::media::MediaStore;
use crate::models::NewUser;
use crate::repository::Datastore;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

async fn register<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let draft: NewUser = serde_json::from_slice(&body).map_err(|e| {
        debug!("Rejected user body: {}", e);
        Error::validation("Please add all fields")
    })?;

    let (user, created) = state.users.register(draft).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, message(format!("Welcome, {}", user.name))))
}

async fn all_users<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    AdminUser(_): AdminUser,
) -> Result<impl IntoResponse> {
    let users = state.users.all_users().await?;
    Ok(Json(json!({ "success": true, "users": users })))
}

async fn single<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let user = state.users.user(&id).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

async fn remove<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.users.delete(&id).await?;
    Ok(message("User Deleted Successfully"))
}

pub(crate) fn routes<D, B, M>() -> Router<AppState<D, B, M>>
where
    D: Datastore,
    B: CacheBackend,
    M: MediaStore,
{
    Router::new()
        .route("/new", post(register::<D, B, M>))
        .route("/all", get(all_users::<D, B, M>))
        .route("/{id}", get(single::<D, B, M>).delete(remove::<D, B, M>))
}
