pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ApiResult, ErrorPayload};
pub use routes::{API_PREFIX, AppServices, router};
