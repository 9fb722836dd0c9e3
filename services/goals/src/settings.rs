//! Configuration management
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults ([`AppConfig::default`])
//! 2. optional `config/goals.{toml,yaml,json}`
//! 3. environment variables prefixed `GOALS`, with `__` between sections,
//!    e.g. `GOALS__SERVER__PORT=8080` or `GOALS__SESSION__SECRET=...`

use common::database::DatabaseConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::rate_limiter::RateLimiterConfig;

/// Session secret used when none is configured. Fine for local use only.
pub const DEVELOPMENT_SECRET: &str = "goal-tracker-development-secret";

const DEFAULT_CONFIG_FILE: &str = "config/goals";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    /// HMAC key for session cookies
    pub secret: String,
    /// Session lifetime in seconds
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseConfig,
    pub session: SessionSettings,
    pub login: RateLimiterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            database: DatabaseConfig::default(),
            session: SessionSettings {
                secret: DEVELOPMENT_SECRET.to_string(),
                ttl_seconds: 86_400,
            },
            login: RateLimiterConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration using `file` (without extension) as the optional
    /// config file
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("GOALS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// `host:port` to listen on
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn uses_development_secret(&self) -> bool {
        self.session.secret == DEVELOPMENT_SECRET
    }
}
