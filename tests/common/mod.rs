// Common test utilities for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use identity_admin::AppData;
use identity_admin::config::{EnvironmentProvider, Settings};
use identity_admin::errors::InternalError;
use identity_admin::providers::CredentialHasher;
use identity_admin::types::internal::{Role, RoleStatus, User};
use identity_admin::types::internal::{RequestContext, NewUser, UserStatus};
use migration::{IdentityMigrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Creates an in-memory identity database with migrations applied
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

/// File-backed identity database behind a pool of several connections
///
/// Unlike the in-memory database every connection sees the same data, so
/// flows can really overlap. Keep the returned directory alive for the
/// duration of the test.
pub async fn setup_pooled_db(connections: u32) -> (DatabaseConnection, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("identity.db").display());
    let mut options = ConnectOptions::new(url);
    options
        .max_connections(connections)
        .min_connections(connections)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to create pooled test database");

    IdentityMigrator::up(&db, None)
        .await
        .expect("Failed to run identity migrations");

    (db, dir)
}

/// Environment provider backed by a map
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            vars: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }
}

impl EnvironmentProvider for MapEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn test_settings() -> Settings {
    let env = MapEnvironment::new(&[("PASSWORD_PEPPER", "integration-test-pepper")]);
    Settings::from_env_provider(Arc::new(env)).expect("valid test settings")
}

/// Fast reversible digest so flows run without Argon2 cost
pub struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, plaintext: &str) -> Result<String, InternalError> {
        Ok(format!("plain:{}", plaintext))
    }

    fn compare(&self, digest: &str, plaintext: &str) -> Result<bool, InternalError> {
        Ok(digest.strip_prefix("plain:") == Some(plaintext))
    }
}

pub async fn setup_app() -> Arc<AppData> {
    let db = setup_test_db().await;
    Arc::new(AppData::with_hasher(&test_settings(), db, Arc::new(PlainHasher)))
}

pub async fn setup_pooled_app(connections: u32) -> (Arc<AppData>, tempfile::TempDir) {
    let (db, dir) = setup_pooled_db(connections).await;
    (Arc::new(AppData::with_hasher(&test_settings(), db, Arc::new(PlainHasher))), dir)
}

pub async fn seed_role(app: &AppData, name: &str, sort: i32) -> Role {
    app.role_store
        .create(name, sort, RoleStatus::Enabled)
        .await
        .expect("Failed to seed role")
}

pub async fn seed_user(app: &AppData, username: &str, password: &str, role_ids: Vec<i64>) -> User {
    let new_user = NewUser {
        username: username.to_string(),
        password_hash: app.hasher.hash(password).expect("hash"),
        mobile: String::new(),
        avatar: String::new(),
        nickname: String::new(),
        introduction: String::new(),
        status: UserStatus::Enabled,
        creator: "root".to_string(),
        role_ids,
    };
    app.user_store.create(new_user).await.expect("Failed to seed user")
}

pub fn ctx(user: &User) -> RequestContext {
    RequestContext::for_actor(user.clone())
}

/// Helper to manage environment variables in tests
///
/// Cleans up specified environment variables on creation and drop,
/// ensuring test isolation when dealing with global environment state.
pub struct EnvGuard {
    vars: Vec<String>,
}

impl EnvGuard {
    pub fn new(vars: Vec<&str>) -> Self {
        for var in &vars {
            unsafe {
                std::env::remove_var(var);
            }
        }
        Self {
            vars: vars.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for var in &self.vars {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }
}

/// Global mutex for tests that modify environment variables
///
/// Environment variables are process-global, so tests that modify them
/// must run serially to avoid race conditions.
pub static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());
