#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authentication helpers: HS256 access/refresh tokens and bcrypt passwords.

pub mod config;
pub mod error;
pub mod jwt;
pub mod password;

pub use config::AuthConfig;
pub use error::{PasswordError, TokenError};
pub use jwt::{Claims, TokenCodec, TokenKind, TokenPair};
pub use password::{hash_password, verify_password};
