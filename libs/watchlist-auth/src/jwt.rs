//! Signed access and refresh tokens.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use watchlist_security::CallerContext;

use crate::config::AuthConfig;
use crate::error::TokenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Payload carried by both token kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    #[serde(default)]
    pub is_admin: bool,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// Claims for `user_id` expiring `ttl_secs` from now.
    #[must_use]
    pub fn new(user_id: Uuid, is_admin: bool, ttl_secs: u64) -> Self {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        Self {
            user_id,
            is_admin,
            exp: Utc::now().timestamp().saturating_add(ttl),
        }
    }

    /// Caller identity this token stands for.
    #[must_use]
    pub fn caller(&self) -> CallerContext {
        if self.is_admin {
            CallerContext::admin(self.user_id)
        } else {
            CallerContext::user(self.user_id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and verifies tokens with the secrets of an [`AuthConfig`].
#[derive(Clone)]
pub struct TokenCodec {
    cfg: AuthConfig,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.cfg.algorithm)
            .field("access_expire_secs", &self.cfg.access_expire_secs)
            .field("refresh_expire_secs", &self.cfg.refresh_expire_secs)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    #[must_use]
    pub fn new(cfg: AuthConfig) -> Self {
        Self { cfg }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.cfg
    }

    fn secret(&self, kind: TokenKind) -> &SecretString {
        match kind {
            TokenKind::Access => &self.cfg.access_secret_key,
            TokenKind::Refresh => &self.cfg.refresh_secret_key,
        }
    }

    fn ttl(&self, kind: TokenKind) -> u64 {
        match kind {
            TokenKind::Access => self.cfg.access_expire_secs,
            TokenKind::Refresh => self.cfg.refresh_expire_secs,
        }
    }

    /// Sign a `kind` token for `user_id` with that kind's lifetime.
    ///
    /// # Errors
    /// Returns `TokenError::Encode` if signing fails.
    pub fn issue(&self, user_id: Uuid, is_admin: bool, kind: TokenKind) -> Result<String, TokenError> {
        self.encode_claims(&Claims::new(user_id, is_admin, self.ttl(kind)), kind)
    }

    /// Sign an access token and a refresh token for the same subject.
    ///
    /// # Errors
    /// Returns `TokenError::Encode` if signing fails.
    pub fn issue_pair(&self, user_id: Uuid, is_admin: bool) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(user_id, is_admin, TokenKind::Access)?,
            refresh_token: self.issue(user_id, is_admin, TokenKind::Refresh)?,
        })
    }

    /// Sign arbitrary claims with the `kind` secret.
    ///
    /// # Errors
    /// Returns `TokenError::Encode` if signing fails.
    pub fn encode_claims(&self, claims: &Claims, kind: TokenKind) -> Result<String, TokenError> {
        let key = EncodingKey::from_secret(self.secret(kind).expose_secret().as_bytes());
        encode(&Header::new(self.cfg.algorithm), claims, &key)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify `token` against the `kind` secret and return its claims.
    ///
    /// Expired tokens are logged as warnings, every other failure as an error.
    ///
    /// # Errors
    /// `TokenError::Expired` or `TokenError::Invalid`.
    pub fn decode(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let key = DecodingKey::from_secret(self.secret(kind).expose_secret().as_bytes());
        let mut validation = Validation::new(self.cfg.algorithm);
        validation.leeway = 0;
        match decode::<Claims>(token, &key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                let err = TokenError::from(e);
                if err.is_expired() {
                    tracing::warn!(kind = kind.as_str(), "token expired");
                } else {
                    tracing::error!(kind = kind.as_str(), error = %err, "token rejected");
                }
                Err(err)
            }
        }
    }
}
