use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EnvironmentProvider, SettingsError};

const DEFAULT_DATABASE_URL: &str = "sqlite://identity.db?mode=rwc";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_CACHE_SWEEP_SECS: u64 = 48 * 60 * 60;
const DEFAULT_USER_PASSWORD: &str = "123456";
const MIN_PEPPER_LENGTH: usize = 16;

/// Runtime settings for the identity backend
pub struct Settings {
    database_url: String,
    max_connections: u32,
    store_timeout: Duration,
    cache_ttl: Duration,
    cache_sweep_interval: Duration,
    default_user_password: String,
    password_pepper: String,
}

impl Settings {
    /// Load settings through an environment provider
    ///
    /// # Errors
    /// `SettingsError::Missing` when `PASSWORD_PEPPER` is absent, `Parse` for
    /// non-numeric values and `Invalid` for values outside their range.
    pub fn from_env_provider(env: Arc<dyn EnvironmentProvider + Send + Sync>) -> Result<Self, SettingsError> {
        let database_url = env
            .get_var("DATABASE_URL")
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let max_connections: u32 = parse_or(&*env, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(invalid("DATABASE_MAX_CONNECTIONS", "must be at least 1"));
        }

        let store_timeout_ms: u64 = parse_or(&*env, "STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?;
        if store_timeout_ms == 0 {
            return Err(invalid("STORE_TIMEOUT_MS", "must be greater than zero"));
        }

        let cache_ttl_secs: u64 = parse_or(&*env, "IDENTITY_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        let cache_sweep_secs: u64 = parse_or(&*env, "IDENTITY_CACHE_SWEEP_SECS", DEFAULT_CACHE_SWEEP_SECS)?;
        if cache_ttl_secs == 0 {
            return Err(invalid("IDENTITY_CACHE_TTL_SECS", "must be greater than zero"));
        }
        if cache_sweep_secs < cache_ttl_secs {
            return Err(invalid(
                "IDENTITY_CACHE_SWEEP_SECS",
                "sweep interval must not be shorter than the cache TTL",
            ));
        }

        let default_user_password = env
            .get_var("DEFAULT_USER_PASSWORD")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_PASSWORD.to_string());

        let password_pepper = env.get_var("PASSWORD_PEPPER").ok_or_else(|| SettingsError::Missing {
            setting_name: "PASSWORD_PEPPER".to_string(),
        })?;
        if password_pepper.len() < MIN_PEPPER_LENGTH {
            return Err(invalid(
                "PASSWORD_PEPPER",
                &format!("must be at least {} characters, got {}", MIN_PEPPER_LENGTH, password_pepper.len()),
            ));
        }

        Ok(Self {
            database_url,
            max_connections,
            store_timeout: Duration::from_millis(store_timeout_ms),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache_sweep_interval: Duration::from_secs(cache_sweep_secs),
            default_user_password,
            password_pepper,
        })
    }

    /// Convenience method that uses the system environment provider
    pub fn from_env() -> Result<Self, SettingsError> {
        use crate::config::SystemEnvironment;
        Self::from_env_provider(Arc::new(SystemEnvironment))
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        self.cache_sweep_interval
    }

    pub fn default_user_password(&self) -> &str {
        &self.default_user_password
    }

    pub fn password_pepper(&self) -> &str {
        &self.password_pepper
    }
}

fn parse_or<T>(env: &(dyn EnvironmentProvider + Send + Sync), name: &str, default: T) -> Result<T, SettingsError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env.get_var(name) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| SettingsError::Parse {
            setting_name: name.to_string(),
            error: format!("'{}': {}", raw, e),
        }),
        None => Ok(default),
    }
}

fn invalid(name: &str, reason: &str) -> SettingsError {
    SettingsError::Invalid {
        setting_name: name.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("database_url", &self.database_url)
            .field("max_connections", &self.max_connections)
            .field("store_timeout", &self.store_timeout)
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_sweep_interval", &self.cache_sweep_interval)
            .field("password_pepper", &"[redacted]")
            .finish_non_exhaustive()
    }
}
