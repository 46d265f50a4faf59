//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    pub request_timeout_ms: u64,
    pub db_timeout_ms: u64,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable config value");
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// This method is used internally to populate the singleton. It panics
    /// if required variables are missing.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "lectern".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info,services=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH").expect("DATABASE_PATH is required"),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: parsed_or("PORT", 3000),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET is required"),
            jwt_duration_minutes: parsed_or("JWT_DURATION_MINUTES", 60),
            request_timeout_ms: parsed_or("REQUEST_TIMEOUT_MS", 10_000),
            db_timeout_ms: parsed_or("DB_TIMEOUT_MS", 5_000),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock
                .write()
                .expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    /// Override `env` value.
    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_jwt_duration_minutes(value: impl Into<u64>) {
        AppConfig::set_field(|cfg| cfg.jwt_duration_minutes = value.into());
    }

    pub fn set_request_timeout_ms(value: impl Into<u64>) {
        AppConfig::set_field(|cfg| cfg.request_timeout_ms = value.into());
    }

    pub fn set_db_timeout_ms(value: impl Into<u64>) {
        AppConfig::set_field(|cfg| cfg.db_timeout_ms = value.into());
    }
}

// --- Accessors ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn jwt_secret() -> String {
    AppConfig::global().jwt_secret.clone()
}

pub fn jwt_duration_minutes() -> u64 {
    AppConfig::global().jwt_duration_minutes
}

pub fn request_timeout_ms() -> u64 {
    AppConfig::global().request_timeout_ms
}

pub fn db_timeout_ms() -> u64 {
    AppConfig::global().db_timeout_ms
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn seed_required_env() {
        unsafe {
            env::set_var("DATABASE_PATH", "data/test.db");
            env::set_var("JWT_SECRET", "config-test-secret");
        }
    }

    #[test]
    #[serial]
    fn setters_override_and_reset_restores() {
        seed_required_env();
        AppConfig::reset();

        AppConfig::set_request_timeout_ms(250u64);
        assert_eq!(request_timeout_ms(), 250);

        AppConfig::set_jwt_secret("override");
        assert_eq!(jwt_secret(), "override");

        unsafe {
            env::remove_var("REQUEST_TIMEOUT_MS");
        }
        AppConfig::reset();
        assert_eq!(request_timeout_ms(), 10_000);
        assert_eq!(jwt_secret(), "config-test-secret");
    }

    #[test]
    #[serial]
    fn unparsable_numbers_fall_back_to_defaults() {
        seed_required_env();
        unsafe {
            env::set_var("PORT", "not-a-port");
        }
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.port, 3000);
        unsafe {
            env::remove_var("PORT");
        }
    }
}
