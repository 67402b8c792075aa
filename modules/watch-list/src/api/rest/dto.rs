use serde::{Deserialize, Serialize};
use uuid::Uuid;
use watchlist_db::query::parse_filters;
use watchlist_db::{FilterSpec, OrderBy};

use super::error::{ApiError, ApiResult};
use crate::domain::ListParams;

/// Query string of list endpoints.
///
/// `filters` is JSON: one `{field, value, operator}` object or an array of
/// them. `order_by` is a comma-separated list of `field` / `-field`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQueryParams {
    pub filters: Option<String>,
    pub search: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    #[serde(default)]
    pub verbose: bool,
}

impl ListQueryParams {
    /// # Errors
    /// Returns a filter error when `filters` is not valid filter JSON.
    pub fn into_params(self) -> ApiResult<ListParams> {
        Ok(ListParams {
            filters: parse_filter_param(self.filters.as_deref())?,
            search: self.search,
            order_by: self
                .order_by
                .as_deref()
                .map(parse_order_by)
                .unwrap_or_default(),
            limit: self.limit,
            offset: self.offset,
            verbose: self.verbose,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountQueryParams {
    pub filters: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DetailQueryParams {
    #[serde(default)]
    pub verbose: bool,
}

/// # Errors
/// Returns a filter error when `raw` is not valid filter JSON.
pub fn parse_filter_param(raw: Option<&str>) -> ApiResult<Vec<FilterSpec>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(raw) => parse_filters(raw).map_err(|reason| ApiError::filter(&reason)),
    }
}

fn parse_order_by(raw: &str) -> Vec<OrderBy> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(OrderBy::parse)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisableAdminsRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisabledResponse {
    pub disabled: u64,
}
