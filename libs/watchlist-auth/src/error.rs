use thiserror::Error;

/// Why a token could not be issued or accepted.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("failed to sign token: {0}")]
    Encode(String),
}

impl TokenError {
    /// True when the token was well-formed but past its expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidToken => Self::Invalid("malformed token".into()),
            ErrorKind::InvalidSignature => Self::Invalid("signature mismatch".into()),
            ErrorKind::InvalidAlgorithm => Self::Invalid("unexpected algorithm".into()),
            _ => Self::Invalid(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password must not be empty")]
    Empty,
}
