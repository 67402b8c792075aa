//! Error responses of the REST API.
//!
//! Every error is rendered as `{code, type, message, loc, attr}`. Messages may
//! come from templates with `$name` placeholders, filled with
//! [`ApiError::from_template`].

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use watchlist_auth::PasswordError;
use watchlist_db::{QueryError, RepositoryError};
use watchlist_security::{PERMISSION_ERROR_TYPE, PermissionDenied};

use crate::domain::DomainError;

pub const FILTER_ERROR_TYPE: &str = "filter_error";
pub const VALIDATION_ERROR_TYPE: &str = "validation_error";
pub const CLIENT_ERROR_TYPE: &str = "client_error";
pub const SERVER_ERROR_TYPE: &str = "server_error";

pub type ApiResult<T> = Result<T, ApiError>;

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub loc: Option<String>,
    pub attr: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    kind: &'static str,
    message: String,
    loc: Option<String>,
    attr: Option<String>,
    bearer_challenge: bool,
}

impl ApiError {
    #[must_use]
    pub fn new(
        status: StatusCode,
        code: &'static str,
        kind: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code,
            kind,
            message: message.into(),
            loc: None,
            attr: None,
            bearer_challenge: false,
        }
    }

    /// Replace the message with `template` filled from `vars`.
    #[must_use]
    pub fn from_template(mut self, template: &str, vars: &[(&str, &str)]) -> Self {
        self.message = safe_substitute(template, vars);
        self
    }

    #[must_use]
    pub fn with_attr(mut self, attr: impl Into<String>) -> Self {
        self.attr = Some(attr.into());
        self
    }

    #[must_use]
    pub fn with_loc(mut self, loc: impl Into<String>) -> Self {
        self.loc = Some(loc.into());
        self
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }

    #[must_use]
    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            code: self.code.to_owned(),
            kind: self.kind.to_owned(),
            message: self.message.clone(),
            loc: self.loc.clone(),
            attr: self.attr.clone(),
        }
    }

    #[must_use]
    pub fn filter(reason: &str) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "incorrect_filter",
            FILTER_ERROR_TYPE,
            "Invalid filter.",
        )
        .from_template("Invalid filter: $reason.", &[("reason", reason)])
        .with_loc("query.filters")
    }

    #[must_use]
    pub fn filter_field(field: &str, model: &str) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_filter_field",
            FILTER_ERROR_TYPE,
            "Invalid filter field.",
        )
        .from_template(
            "Model '$model' has no field '$field'.",
            &[("model", model), ("field", field)],
        )
        .with_loc("query.filters")
        .with_attr(field)
    }

    #[must_use]
    pub fn permission(denied: &PermissionDenied) -> Self {
        let message = match denied {
            PermissionDenied::NoRule { .. } => "Access to the resource is denied.",
            PermissionDenied::AnonNotAllowed { .. } => {
                "Anonymous users have no access to this resource."
            }
            PermissionDenied::UserNotAllowed { .. } => "Users have no access to this resource.",
            PermissionDenied::AdminNotAllowed { .. } => {
                "Administrators have no access to this resource."
            }
            PermissionDenied::NoOneAllowed { .. } => "The resource is not available to anyone.",
        };
        Self::new(
            StatusCode::FORBIDDEN,
            denied.code(),
            PERMISSION_ERROR_TYPE,
            message,
        )
    }

    /// 401 with a `WWW-Authenticate: Bearer` challenge.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        let mut err = Self::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            PERMISSION_ERROR_TYPE,
            message,
        );
        err.bearer_challenge = true;
        err
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", CLIENT_ERROR_TYPE, message)
    }

    #[must_use]
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_value",
            VALIDATION_ERROR_TYPE,
            message,
        )
        .with_attr(field)
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "bad_request",
            CLIENT_ERROR_TYPE,
            message,
        )
    }

    /// Store and configuration failures. The message never carries details.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            SERVER_ERROR_TYPE,
            "Internal server error.",
        )
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound { .. } => Self::not_found(e.to_string()),
            DomainError::Validation { field, message } => Self::validation(&field, message),
            DomainError::Filter { field, reason } => Self::filter(&reason).with_attr(field),
            DomainError::FilterField { field, model } => Self::filter_field(&field, &model),
            DomainError::InvalidCredentials => Self::unauthorized("Invalid login or password."),
            DomainError::AccountDisabled => Self::new(
                StatusCode::FORBIDDEN,
                "account_disabled",
                PERMISSION_ERROR_TYPE,
                "The account is disabled.",
            ),
            DomainError::DeleteFailed { .. } => Self::new(
                StatusCode::CONFLICT,
                "delete_failed",
                CLIENT_ERROR_TYPE,
                e.to_string(),
            ),
            DomainError::Repository(RepositoryError::Permission(denied)) => {
                Self::permission(&denied)
            }
            DomainError::Token(err) if err.is_expired() => {
                Self::unauthorized("The token has expired.")
            }
            DomainError::Token(_) => Self::unauthorized("The token is invalid."),
            DomainError::Password(PasswordError::Empty) => {
                Self::validation("password", "Password must not be empty.")
            }
            DomainError::Repository(RepositoryError::Query(ref q)) if q.is_caller_error() => {
                tracing::warn!(error = %e, "unmapped query error");
                Self::bad_request(e.to_string())
            }
            DomainError::Repository(_)
            | DomainError::Configuration(_)
            | DomainError::Password(PasswordError::Hash(_))
            | DomainError::Internal(_) => {
                tracing::error!(error = %e, "request failed");
                Self::internal()
            }
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        DomainError::from(e).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.payload())).into_response();
        if self.bearer_challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Fill `$name` and `${name}` placeholders from `vars`.
///
/// Unknown placeholders are left as written; `$$` renders a single `$`.
#[must_use]
pub fn safe_substitute(template: &str, vars: &[(&str, &str)]) -> String {
    let lookup = |name: &str| vars.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        if let Some(braced) = after.strip_prefix('{')
            && let Some(end) = braced.find('}')
            && is_identifier(&braced[..end])
        {
            let name = &braced[..end];
            match lookup(name) {
                Some(value) => out.push_str(value),
                None => out.push_str(&rest[pos..pos + end + 3]),
            }
            rest = &braced[end + 1..];
            continue;
        }

        let len = identifier_len(after);
        if len == 0 {
            out.push('$');
            rest = after;
            continue;
        }
        let name = &after[..len];
        match lookup(name) {
            Some(value) => out.push_str(value),
            None => {
                out.push('$');
                out.push_str(name);
            }
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    out
}

fn identifier_len(s: &str) -> usize {
    let mut len = 0;
    for (i, c) in s.char_indices() {
        let ok = if i == 0 {
            c.is_ascii_alphabetic() || c == '_'
        } else {
            c.is_ascii_alphanumeric() || c == '_'
        };
        if !ok {
            break;
        }
        len = i + c.len_utf8();
    }
    len
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && identifier_len(s) == s.len()
}
