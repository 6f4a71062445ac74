//! Configuration management for the lending service

use crate::domain::LoanPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub url: String,
    pub anon_key: String,
    pub timeout_secs: u64,
}

impl AuthConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LendingConfig {
    #[serde(default)]
    pub policy: LoanPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, `RUST_LOG` takes precedence
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub lending: LendingConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from defaults, files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        Self::builder(&run_mode)?.build()?.try_deserialize()
    }

    fn builder(
        run_mode: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "postgres://localhost/library")?
            .set_default("database.max_connections", 5)?
            .set_default("catalog.base_url", "https://gutendex.com")?
            .set_default("catalog.timeout_secs", 10)?
            .set_default("auth.url", "http://localhost:54321")?
            .set_default("auth.anon_key", "")?
            .set_default("auth.timeout_secs", 10)?
            .set_default("lending.policy", "per_book")?
            .set_default(
                "logging.level",
                "library_lending=debug,tower_http=debug,axum=trace",
            )?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // LIBRARY__LENDING__POLICY=per_user
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("auth.url", env::var("SUPABASE_URL").ok())?
            .set_override_option("auth.anon_key", env::var("SUPABASE_ANON_KEY").ok())?
            .set_override_option("catalog.base_url", env::var("CATALOG_URL").ok())?
            .set_override_option("server.port", env::var("PORT").ok())?;

        Ok(builder)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
