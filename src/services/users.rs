//! Users and the admin check.

use crate::backend::CacheBackend;
use crate::cache::CacheService;
use crate::error::{Error, Result};
use crate::invalidation::Invalidation;
use crate::models::{NewUser, User};
use crate::repository::{DataRepository, Datastore};

pub struct UserService<D: Datastore, B: CacheBackend> {
    store: D,
    cache: CacheService<B>,
}

impl<D: Datastore, B: CacheBackend> Clone for UserService<D, B> {
    fn clone(&self) -> Self {
        UserService {
            store: self.store.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<D: Datastore, B: CacheBackend> UserService<D, B> {
    pub fn new(store: D, cache: CacheService<B>) -> Self {
        Self { store, cache }
    }

    /// Register a user. An id that is already registered returns the
    /// existing user and `false`.
    pub async fn register(&self, draft: NewUser) -> Result<(User, bool)> {
        if draft.id.trim().is_empty() || draft.name.trim().is_empty() || draft.email.trim().is_empty()
        {
            return Err(Error::validation("Please add all fields"));
        }

        if let Some(existing) = self.store.users().fetch_by_id(&draft.id).await? {
            debug!("[Users] {} already registered", existing.id);
            return Ok((existing, false));
        }

        let user = self.store.users().save(User::new(draft)).await?;
        info!("[Users] Registered {} as {:?}", user.id, user.role);

        self.cache.invalidate(&Invalidation::new().admin()).await?;
        Ok((user, true))
    }

    pub async fn user(&self, id: &str) -> Result<User> {
        self.store
            .users()
            .fetch_by_id(&id.to_string())
            .await?
            .ok_or_else(|| Error::not_found("User Not Found"))
    }

    pub async fn all_users(&self) -> Result<Vec<User>> {
        self.store.users().fetch_all().await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store
            .users()
            .remove(&id.to_string())
            .await?
            .ok_or_else(|| Error::not_found("User Not Found"))?;
        info!("[Users] Deleted {}", id);

        self.cache.invalidate(&Invalidation::new().admin()).await?;
        Ok(())
    }

    /// Resolve the caller id to an admin user.
    ///
    /// # Errors
    ///
    /// - `Unauthorized("Login First")` when no id is given
    /// - `Unauthorized("Invalid Id")` when the id is unknown
    /// - `Forbidden("Only admin can access this")` for non-admins
    pub async fn require_admin(&self, id: Option<&str>) -> Result<User> {
        let id = id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::Unauthorized("Login First".to_string()))?;

        let user = self
            .store
            .users()
            .fetch_by_id(&id.to_string())
            .await?
            .ok_or_else(|| Error::Unauthorized("Invalid Id".to_string()))?;

        if !user.is_admin() {
            return Err(Error::Forbidden("Only admin can access this".to_string()));
        }
        Ok(user)
    }
}
