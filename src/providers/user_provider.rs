use std::sync::Arc;

use crate::cache::IdentityCache;
use crate::errors::internal::UserError;
use crate::errors::{AdminError, InternalError};
use crate::stores::UserStore;
use crate::types::internal::{RequestContext, User};

/// Read-through access to user identities
///
/// Reads go cache-first keyed by username. Fills are ticketed so a fill
/// that overlaps a mutation of the same user never lands after that
/// mutation's invalidation. Mutating flows call [`UserProvider::refresh`]
/// after their commit and before they return.
pub struct UserProvider {
    store: Arc<UserStore>,
    cache: Arc<IdentityCache>,
}

impl UserProvider {
    pub fn new(store: Arc<UserStore>, cache: Arc<IdentityCache>) -> Self {
        Self { store, cache }
    }

    /// Resolve the actor of `ctx` to its current stored identity
    ///
    /// A cached entry is only trusted when it carries the actor's id.
    /// Otherwise the enabled user is read by id and written back under its
    /// own username.
    ///
    /// # Errors
    /// * `Unauthenticated` - The context carries no actor
    /// * `NotFound` - The actor no longer exists or is disabled
    pub async fn current_user(&self, ctx: &RequestContext) -> Result<User, AdminError> {
        let actor = ctx.actor()?;

        if let Some(cached) = self.cache.get(&actor.username) {
            if cached.id == actor.id {
                tracing::debug!(request_id = %ctx.request_id, user_id = actor.id, "Identity cache hit");
                return Ok(cached);
            }
            tracing::debug!(
                request_id = %ctx.request_id,
                user_id = actor.id,
                cached_id = cached.id,
                "Identity cache entry belongs to another id, ignoring"
            );
        }

        let ticket = self.cache.fill_ticket(&actor.username);
        let user = self.store.find_by_id(actor.id).await?;

        if user.username == actor.username {
            let filled = self.cache.put_if_unchanged(&user.username, user.clone(), ticket);
            tracing::debug!(request_id = %ctx.request_id, user_id = user.id, filled, "Identity cache fill");
        }

        Ok(user)
    }

    /// Enabled user by id, refreshing its cache entry
    ///
    /// The first read only learns the username the entry is keyed by. The
    /// cached value comes from a second read taken after the fill ticket.
    pub async fn user_by_id(&self, id: i64) -> Result<User, AdminError> {
        let located = self.store.find_by_id(id).await?;
        let user = self.fill(&located.username, id).await?;

        if !user.is_enabled() {
            return Err(InternalError::from(UserError::UserIdNotFound { user_id: id }).into());
        }

        Ok(user)
    }

    /// User by username straight from the store, any status
    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, InternalError> {
        self.store.find_by_username(username).await
    }

    /// Re-fill the cache entry for a user whose write has just committed
    ///
    /// Must run after the commit. The invalidation rejects every fill whose
    /// ticket predates it, so a read taken before the commit can never land.
    /// The entry is then filled from a fresh read. If that read fails the
    /// entry stays invalidated and `committed` is returned as is.
    pub async fn refresh(&self, committed: User) -> User {
        self.cache.invalidate(&committed.username);

        let reloaded = self.fill(&committed.username, committed.id).await;
        match reloaded {
            Ok(fresh) => fresh,
            Err(err) => {
                tracing::warn!(user_id = committed.id, error = %err, "Identity cache reload failed, entry left invalidated");
                committed
            }
        }
    }

    /// Ticketed read-through of one user, any status
    ///
    /// Disabled users and users stored under another username are returned
    /// but never cached. A fill that loses its ticket leaves the entry as is.
    async fn fill(&self, username: &str, id: i64) -> Result<User, InternalError> {
        let ticket = self.cache.fill_ticket(username);
        let user = self.store.find_by_id_any_status(id).await?;

        if !user.is_enabled() || user.username != username {
            tracing::debug!(user_id = user.id, "Identity cache fill skipped");
            return Ok(user);
        }

        let filled = self.cache.put_if_unchanged(username, user.clone(), ticket);
        tracing::debug!(user_id = user.id, filled, "Identity cache fill");

        Ok(user)
    }

    pub fn store(&self) -> &Arc<UserStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<IdentityCache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::test::utils::{new_user, setup_test_db};
    use crate::types::internal::{UserStatus, UserUpdate};

    async fn provider() -> UserProvider {
        let db = setup_test_db().await;
        let store = Arc::new(UserStore::new(db, Duration::from_secs(5)));
        let cache = Arc::new(IdentityCache::new(Duration::from_secs(60), Duration::from_secs(120)));
        UserProvider::new(store, cache)
    }

    #[tokio::test]
    async fn test_current_user_fills_cache_on_miss() {
        let provider = provider().await;
        let alice = provider.store().create(new_user("alice", "d1", vec![])).await.unwrap();
        let ctx = RequestContext::for_actor(alice.clone());

        assert!(provider.cache().get("alice").is_none());
        let resolved = provider.current_user(&ctx).await.unwrap();

        assert_eq!(resolved.id, alice.id);
        assert_eq!(provider.cache().get("alice").unwrap().id, alice.id);
    }

    #[tokio::test]
    async fn test_current_user_serves_cache_hit() {
        let provider = provider().await;
        let alice = provider.store().create(new_user("alice", "store-digest", vec![])).await.unwrap();
        let mut cached = alice.clone();
        cached.password_hash = "cached-digest".to_string();
        provider.cache().put("alice", cached, None);

        let resolved = provider.current_user(&RequestContext::for_actor(alice)).await.unwrap();
        assert_eq!(resolved.password_hash, "cached-digest");
    }

    #[tokio::test]
    async fn test_current_user_ignores_entry_of_another_id() {
        let provider = provider().await;
        let alice = provider.store().create(new_user("alice", "alice-digest", vec![])).await.unwrap();
        let mut impostor = alice.clone();
        impostor.id = alice.id + 100;
        impostor.password_hash = "impostor-digest".to_string();
        provider.cache().put("alice", impostor, None);

        let resolved = provider.current_user(&RequestContext::for_actor(alice.clone())).await.unwrap();

        assert_eq!(resolved.id, alice.id);
        assert_eq!(resolved.password_hash, "alice-digest");
    }

    #[tokio::test]
    async fn test_current_user_requires_actor() {
        let provider = provider().await;
        let result = provider.current_user(&RequestContext::for_system()).await;
        assert!(matches!(result, Err(AdminError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_current_user_disabled_actor_not_found() {
        let provider = provider().await;
        let mut seed = new_user("bob", "d", vec![]);
        seed.status = UserStatus::Disabled;
        let bob = provider.store().create(seed).await.unwrap();

        let result = provider.current_user(&RequestContext::for_actor(bob)).await;
        assert!(matches!(result, Err(AdminError::NotFound(_))));
        assert!(provider.cache().get("bob").is_none());
    }

    #[tokio::test]
    async fn test_refresh_replaces_and_drops_disabled() {
        let provider = provider().await;
        let carol = provider.store().create(new_user("carol", "old", vec![])).await.unwrap();
        provider.cache().put("carol", carol.clone(), None);

        let updated = provider
            .store()
            .update_password(carol.id, "new".to_string())
            .await
            .unwrap();
        provider.refresh(updated).await;
        assert_eq!(provider.cache().get("carol").unwrap().password_hash, "new");

        let disabled = provider
            .store()
            .update_fields(carol.id, UserUpdate {
                status: Some(UserStatus::Disabled),
                ..Default::default()
            })
            .await
            .unwrap();
        provider.refresh(disabled).await;
        assert!(provider.cache().get("carol").is_none());
    }

    #[tokio::test]
    async fn test_refresh_with_stale_argument_caches_store_state() {
        let provider = provider().await;
        let erin = provider.store().create(new_user("erin", "old", vec![])).await.unwrap();
        let first = provider.store().update_password(erin.id, "first".to_string()).await.unwrap();
        provider.store().update_password(erin.id, "second".to_string()).await.unwrap();

        // The first writer refreshes last, holding its own reload
        let refreshed = provider.refresh(first).await;

        assert_eq!(refreshed.password_hash, "second");
        assert_eq!(provider.cache().get("erin").unwrap().password_hash, "second");
    }

    #[tokio::test]
    async fn test_refresh_fences_fill_ticketed_before_commit() {
        let provider = provider().await;
        let frank = provider.store().create(new_user("frank", "old", vec![])).await.unwrap();

        let ticket = provider.cache().fill_ticket("frank");
        let stale = provider.store().find_by_id(frank.id).await.unwrap();
        let committed = provider.store().update_password(frank.id, "new".to_string()).await.unwrap();
        provider.refresh(committed).await;

        assert!(!provider.cache().put_if_unchanged("frank", stale, ticket));
        assert_eq!(provider.cache().get("frank").unwrap().password_hash, "new");
    }

    #[tokio::test]
    async fn test_user_by_id_disabled_is_not_found_and_uncached() {
        let provider = provider().await;
        let mut seed = new_user("gina", "d", vec![]);
        seed.status = UserStatus::Disabled;
        let gina = provider.store().create(seed).await.unwrap();

        assert!(matches!(provider.user_by_id(gina.id).await, Err(AdminError::NotFound(_))));
        assert!(provider.cache().get("gina").is_none());
    }

    #[tokio::test]
    async fn test_user_by_id_refreshes_cache() {
        let provider = provider().await;
        let dave = provider.store().create(new_user("dave", "d", vec![])).await.unwrap();

        let fetched = provider.user_by_id(dave.id).await.unwrap();
        assert_eq!(fetched.username, "dave");
        assert!(provider.cache().get("dave").is_some());

        assert!(matches!(provider.user_by_id(999).await, Err(AdminError::NotFound(_))));
    }
}
