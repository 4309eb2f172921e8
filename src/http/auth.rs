//! Admin guard.
//!
//! The caller identifies itself with an `id` query parameter. Handlers that
//! take an [`AdminUser`] only run when that id belongs to an admin.

use super::AppState;
use crate::backend::CacheBackend;
use crate::error::Error;
use crate::media::MediaStore;
use crate::models::User;
use crate::repository::Datastore;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;

/// Query parameters identifying the caller.
#[derive(Debug, Default, Deserialize)]
pub struct Caller {
    pub id: Option<String>,
}

/// Extractor that requires an admin caller.
///
/// Rejects with 401 "Login First" without an id, 401 "Invalid Id" for an
/// unknown id and 403 "Only admin can access this" for a non-admin.
///
/// ```rust,ignore
/// async fn handler(AdminUser(admin): AdminUser) -> String {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct AdminUser(pub User);

impl<D, B, M> FromRequestParts<AppState<D, B, M>> for AdminUser
where
    D: Datastore,
    B: CacheBackend,
    M: MediaStore,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<D, B, M>,
    ) -> Result<Self, Self::Rejection> {
        let caller = Query::<Caller>::try_from_uri(&parts.uri)
            .map(|Query(caller)| caller)
            .unwrap_or_default();

        let admin = state.users.require_admin(caller.id.as_deref()).await?;
        debug!("Admin {} authorized for {}", admin.id, parts.uri.path());
        Ok(AdminUser(admin))
    }
}
