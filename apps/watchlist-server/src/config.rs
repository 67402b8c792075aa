//! Layered server configuration.
//!
//! Sources, later ones win:
//! 1. built-in defaults;
//! 2. an optional YAML file (`--config`);
//! 3. environment variables: `APP_*` for the server, `DB_*` for the
//!    database, `ADMIN_*` for tokens and password hashing, `LOG_*` for
//!    logging.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use watchlist_auth::AuthConfig;
use watchlist_db::DatabaseConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Apply pending migrations before serving.
    pub migrate_on_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
            migrate_on_start: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,watch_list=debug".to_owned(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub app: ServerConfig,
    pub db: DatabaseConfig,
    pub admin: AuthConfig,
    pub logging: LoggingConfig,
}

/// Environment variables `{prefix}*` nested under `section`.
fn section_env(prefix: &str, section: &'static str) -> Env {
    Env::prefixed(prefix).map(move |key| format!("{section}.{key}").into())
}

impl AppConfig {
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::default("app", ServerConfig::default()))
            .merge(Serialized::default("logging", LoggingConfig::default()));
        if let Some(path) = file {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(section_env("APP_", "app"))
            .merge(section_env("DB_", "db"))
            .merge(section_env("ADMIN_", "admin"))
            .merge(section_env("LOG_", "logging"))
    }

    /// # Errors
    /// Returns the figment error when a source is malformed or a value has
    /// the wrong type or an unknown key.
    pub fn load(file: Option<&Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(file).extract().map_err(Box::new)
    }
}
