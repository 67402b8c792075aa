//! Bearer-token authentication.
//!
//! [`authenticate`] runs before every handler and stores the resolved
//! [`CallerContext`] in the request extensions; handlers take it through the
//! [`Caller`] extractor.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::{HeaderMap, header, request::Parts};
use axum::middleware::Next;
use axum::response::Response;
use watchlist_security::CallerContext;

use super::error::ApiError;
use crate::domain::AccountService;

/// Caller of the current request.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub CallerContext);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerContext>()
            .copied()
            .map(Caller)
            .ok_or_else(|| {
                tracing::error!("caller context missing; authentication middleware not installed");
                ApiError::internal()
            })
    }
}

/// Token from `Authorization: Bearer <token>`, if the header is present.
///
/// # Errors
/// Returns 401 when the header is present but not a bearer token.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let malformed = || ApiError::unauthorized("Malformed authorization header.");
    let value = value.to_str().map_err(|_| malformed())?;
    let (scheme, token) = value.split_once(' ').ok_or_else(malformed)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(malformed());
    }
    Ok(Some(token.to_owned()))
}

/// Resolve the caller: no token means anonymous, a valid access token means
/// its user or admin, anything else is refused with 401.
///
/// # Errors
/// Rejects the request when the token is malformed, invalid or expired, or
/// its account is gone or disabled.
pub async fn authenticate(
    State(accounts): State<Arc<AccountService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = match bearer_token(req.headers())? {
        None => CallerContext::anonymous(),
        Some(token) => accounts.resolve_caller(&token).await.map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
            ApiError::from(e)
        })?,
    };
    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        h
    }

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(bearer_token(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(
            bearer_token(&headers("bearer abc.def")).unwrap().as_deref(),
            Some("abc.def")
        );
    }

    #[test]
    fn other_schemes_are_refused() {
        let err = bearer_token(&headers("Basic dXNlcjpwYXNz")).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
        assert!(bearer_token(&headers("Bearer ")).is_err());
        assert!(bearer_token(&headers("token")).is_err());
    }
}
