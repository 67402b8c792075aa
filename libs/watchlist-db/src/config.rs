use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

fn default_user() -> String {
    "test_user".to_owned()
}

fn default_password() -> SecretString {
    SecretString::from("1234".to_owned())
}

fn default_name() -> String {
    "test_db".to_owned()
}

fn default_host() -> String {
    "localhost".to_owned()
}

fn default_port() -> u16 {
    5432
}

fn default_engine() -> String {
    "postgres".to_owned()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// Database connection settings.
///
/// Either `url` is given verbatim, or the URL is assembled from the discrete
/// fields as `{engine}://{user}:{password}@{host}:{port}/{name}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(
        default = "default_password",
        deserialize_with = "deserialize_secret"
    )]
    pub password: SecretString,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub min_connections: Option<u32>,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Log every SQL statement at debug level.
    #[serde(default)]
    pub sql_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: default_user(),
            password: default_password(),
            name: default_name(),
            host: default_host(),
            port: default_port(),
            engine: default_engine(),
            max_connections: default_max_connections(),
            min_connections: None,
            acquire_timeout_secs: default_acquire_timeout_secs(),
            sql_logging: false,
        }
    }
}

impl DatabaseConfig {
    /// Config pointing at a literal URL, e.g. `sqlite::memory:`.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Connection URL including credentials. Never log the result.
    #[must_use]
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        format!(
            "{engine}://{user}:{password}@{host}:{port}/{name}",
            engine = self.engine,
            user = self.user,
            password = self.password.expose_secret(),
            host = self.host,
            port = self.port,
            name = self.name,
        )
    }

    /// Connection URL with the password masked, safe for logs.
    #[must_use]
    pub fn redacted_url(&self) -> String {
        if let Some(url) = &self.url {
            return match url.split_once('@') {
                Some((creds, rest)) => match creds.rsplit_once(':') {
                    Some((prefix, _)) if prefix.contains("://") => format!("{prefix}:***@{rest}"),
                    _ => url.clone(),
                },
                None => url.clone(),
            };
        }
        format!(
            "{}://{}:***@{}:{}/{}",
            self.engine, self.user, self.host, self.port, self.name
        )
    }

    #[must_use]
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}
