use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::configuration::StoreOptions;

/// Non-secret tunables. Secrets are loaded separately at startup and
/// injected into the application state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: Backend,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub persistence_timeout_ms: u64,
    pub max_write_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub max_rows: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl StoreConfig {
    pub fn options(&self) -> StoreOptions {
        StoreOptions {
            persistence_timeout: Duration::from_millis(self.persistence_timeout_ms),
            max_write_attempts: self.max_write_attempts.max(1),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_BACKEND") {
            match v.as_str() {
                "postgres" => self.database.backend = Backend::Postgres,
                "memory" => self.database.backend = Backend::Memory,
                other => tracing::warn!("Ignoring unknown DATABASE_BACKEND '{}'", other),
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Store overrides
        if let Ok(v) = env::var("STORE_PERSISTENCE_TIMEOUT_MS") {
            self.store.persistence_timeout_ms = v.parse().unwrap_or(self.store.persistence_timeout_ms);
        }
        if let Ok(v) = env::var("STORE_MAX_WRITE_ATTEMPTS") {
            self.store.max_write_attempts = v.parse().unwrap_or(self.store.max_write_attempts);
        }

        // API overrides
        if let Some(v) = env::var("API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_MAX_ROWS") {
            self.api.max_rows = v.parse().unwrap_or(self.api.max_rows);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                backend: Backend::Memory,
                max_connections: 10,
                connection_timeout: 30,
            },
            store: StoreConfig {
                persistence_timeout_ms: 10_000,
                max_write_attempts: 3,
            },
            api: ApiConfig {
                port: 3000,
                max_rows: 1000,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                backend: Backend::Postgres,
                max_connections: 20,
                connection_timeout: 10,
            },
            store: StoreConfig {
                persistence_timeout_ms: 5_000,
                max_write_attempts: 3,
            },
            api: ApiConfig {
                port: 3000,
                max_rows: 500,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                backend: Backend::Postgres,
                max_connections: 50,
                connection_timeout: 5,
            },
            store: StoreConfig {
                persistence_timeout_ms: 3_000,
                max_write_attempts: 5,
            },
            api: ApiConfig {
                port: 3000,
                max_rows: 500,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}
