// Test utilities shared across unit tests
// Only compiled when running tests

use std::sync::Arc;

use migration::{IdentityMigrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::app_data::AppData;
use crate::config::{MockEnvironment, Settings};
use crate::errors::InternalError;
use crate::providers::CredentialHasher;
use crate::types::internal::{NewUser, RequestContext, Role, RoleStatus, User, UserStatus};

/// In-memory SQLite database with the identity schema applied
///
/// The pool is pinned to one connection; every in-memory connection is a
/// separate database.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to create test database");

    IdentityMigrator::up(&db, None)
        .await
        .expect("Failed to run identity migrations");

    db
}

/// Deterministic, fast stand-in for Argon2
pub struct TestHasher;

impl CredentialHasher for TestHasher {
    fn hash(&self, plaintext: &str) -> Result<String, InternalError> {
        Ok(format!("test-hash:{}", plaintext))
    }

    fn compare(&self, digest: &str, plaintext: &str) -> Result<bool, InternalError> {
        match digest.strip_prefix("test-hash:") {
            Some(expected) => Ok(expected == plaintext),
            None => Err(InternalError::crypto("parse_password_hash", "not a test digest")),
        }
    }
}

pub fn test_settings() -> Settings {
    let env = MockEnvironment::empty()
        .with_var("PASSWORD_PEPPER", "test-pepper-for-unit-tests")
        .with_var("IDENTITY_CACHE_TTL_SECS", "60")
        .with_var("IDENTITY_CACHE_SWEEP_SECS", "120");
    Settings::from_env_provider(Arc::new(env)).expect("valid test settings")
}

/// AppData over a fresh in-memory database and the test hasher
pub async fn setup_test_app() -> Arc<AppData> {
    let db = setup_test_db().await;
    Arc::new(AppData::with_hasher(&test_settings(), db, Arc::new(TestHasher)))
}

/// Enabled insert shape created by "root"
pub fn new_user(username: &str, password_hash: &str, role_ids: Vec<i64>) -> NewUser {
    NewUser {
        username: username.to_string(),
        password_hash: password_hash.to_string(),
        mobile: String::new(),
        avatar: String::new(),
        nickname: String::new(),
        introduction: String::new(),
        status: UserStatus::Enabled,
        creator: "root".to_string(),
        role_ids,
    }
}

pub async fn seed_role(app: &AppData, name: &str, sort: i32) -> Role {
    app.role_store
        .create(name, sort, RoleStatus::Enabled)
        .await
        .expect("Failed to seed role")
}

/// Store a user whose password is `password` under the app's hasher
pub async fn seed_user(app: &AppData, username: &str, password: &str, role_ids: Vec<i64>) -> User {
    let digest = app.hasher.hash(password).expect("Failed to hash test password");
    app.user_store
        .create(new_user(username, &digest, role_ids))
        .await
        .expect("Failed to seed user")
}

/// API context for an already stored user
pub fn ctx_for(user: &User) -> RequestContext {
    RequestContext::for_actor(user.clone())
}
