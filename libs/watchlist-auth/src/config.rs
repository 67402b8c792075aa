use jsonwebtoken::Algorithm;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

fn default_access_secret() -> SecretString {
    SecretString::from("some_access_secret_key".to_owned())
}

fn default_refresh_secret() -> SecretString {
    SecretString::from("some_refresh_secret_key".to_owned())
}

fn default_access_expire_secs() -> u64 {
    60 * 10
}

fn default_refresh_expire_secs() -> u64 {
    60 * 60 * 24 * 7
}

fn default_algorithm() -> Algorithm {
    Algorithm::HS256
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// Token and password hashing settings.
///
/// Access and refresh tokens are signed with separate secrets, so a refresh
/// token never validates as an access token and vice versa.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(
        default = "default_access_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub access_secret_key: SecretString,
    #[serde(default = "default_access_expire_secs")]
    pub access_expire_secs: u64,
    #[serde(
        default = "default_refresh_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub refresh_secret_key: SecretString,
    #[serde(default = "default_refresh_expire_secs")]
    pub refresh_expire_secs: u64,
    /// HMAC algorithm used to sign both token kinds.
    #[serde(default = "default_algorithm")]
    pub algorithm: Algorithm,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret_key: default_access_secret(),
            access_expire_secs: default_access_expire_secs(),
            refresh_secret_key: default_refresh_secret(),
            refresh_expire_secs: default_refresh_expire_secs(),
            algorithm: default_algorithm(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}
