use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::cache::IdentityCache;
use crate::config::Settings;
use crate::providers::{Argon2Hasher, CredentialHasher, UserProvider};
use crate::stores::{RoleStore, UserStore};

/// Centralized application data following the main-owned stores pattern
///
/// All dependencies are created once in main.rs and shared across coordinators.
///
/// ```text
/// main.rs
///   ↓
/// AppData::init()
///   ↓ creates once
///   ├─ db (DatabaseConnection)
///   ├─ user_store / role_store (Arc, store timeout applied)
///   ├─ identity_cache (Arc<IdentityCache>)
///   ├─ user_provider (Arc<UserProvider>, store + cache)
///   └─ hasher (Arc<dyn CredentialHasher>)
///   ↓ wrapped in Arc<AppData>
///   ├─ AuthCoordinator::new(app_data)
///   └─ AdminCoordinator::new(app_data)
/// ```
///
/// The cache sweeper is not started here; the caller owns its lifecycle
/// through [`IdentityCache::spawn_sweeper`].
pub struct AppData {
    pub db: DatabaseConnection,
    pub user_store: Arc<UserStore>,
    pub role_store: Arc<RoleStore>,
    pub identity_cache: Arc<IdentityCache>,
    pub user_provider: Arc<UserProvider>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub default_user_password: String,
}

impl AppData {
    /// Build application data with the production Argon2 hasher
    ///
    /// The database should be connected and migrated before calling this.
    pub fn init(settings: &Settings, db: DatabaseConnection) -> Self {
        let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher::new(settings.password_pepper().to_string()));
        Self::with_hasher(settings, db, hasher)
    }

    /// Build application data around a caller-supplied credential hasher
    pub fn with_hasher(settings: &Settings, db: DatabaseConnection, hasher: Arc<dyn CredentialHasher>) -> Self {
        tracing::info!("Initializing AppData...");

        let user_store = Arc::new(UserStore::new(db.clone(), settings.store_timeout()));
        let role_store = Arc::new(RoleStore::new(db.clone(), settings.store_timeout()));

        let identity_cache = Arc::new(IdentityCache::new(
            settings.cache_ttl(),
            settings.cache_sweep_interval(),
        ));
        let user_provider = Arc::new(UserProvider::new(user_store.clone(), identity_cache.clone()));

        tracing::debug!(
            cache_ttl_secs = settings.cache_ttl().as_secs(),
            sweep_secs = identity_cache.sweep_interval().as_secs(),
            store_timeout_ms = settings.store_timeout().as_millis() as u64,
            "Stores and identity cache created"
        );

        Self {
            db,
            user_store,
            role_store,
            identity_cache,
            user_provider,
            hasher,
            default_user_password: settings.default_user_password().to_string(),
        }
    }
}
