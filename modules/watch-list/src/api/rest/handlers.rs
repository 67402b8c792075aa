use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use uuid::Uuid;
use watchlist_auth::TokenPair;

use super::auth::Caller;
use super::dto::{
    AdminLoginRequest, CountQueryParams, CountResponse, DetailQueryParams, DisableAdminsRequest,
    DisabledResponse, ListQueryParams, RefreshRequest, UserCredentials, parse_filter_param,
};
use super::error::{ApiError, ApiResult};
use crate::domain::models::{Account, Element, ElementPatch, NewElement};
use crate::domain::{AccountService, Catalog, CatalogService};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ApiError::validation("body", e.body_text()).with_loc("body"))
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    params
        .map(|Query(v)| v)
        .map_err(|e| ApiError::bad_request(e.body_text()).with_loc("query"))
}

fn path_id(id: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    id.map(|Path(v)| v)
        .map_err(|e| ApiError::validation("id", e.body_text()).with_loc("path"))
}

#[tracing::instrument(skip_all, fields(catalog = C::ENTITY))]
pub async fn list_entries<C: Catalog>(
    Extension(svc): Extension<Arc<CatalogService<C>>>,
    Caller(caller): Caller,
    params: Result<Query<ListQueryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Element<C::Kind>>>> {
    let params = query(params)?.into_params()?;
    Ok(Json(svc.list(&caller, params).await?))
}

#[tracing::instrument(skip_all, fields(catalog = C::ENTITY))]
pub async fn count_entries<C: Catalog>(
    Extension(svc): Extension<Arc<CatalogService<C>>>,
    Caller(caller): Caller,
    params: Result<Query<CountQueryParams>, QueryRejection>,
) -> ApiResult<Json<CountResponse>> {
    let filters = parse_filter_param(query(params)?.filters.as_deref())?;
    let count = svc.count(&caller, &filters).await?;
    Ok(Json(CountResponse { count }))
}

#[tracing::instrument(skip_all, fields(catalog = C::ENTITY))]
pub async fn get_entry<C: Catalog>(
    Extension(svc): Extension<Arc<CatalogService<C>>>,
    Caller(caller): Caller,
    id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<DetailQueryParams>, QueryRejection>,
) -> ApiResult<Json<Element<C::Kind>>> {
    let id = path_id(id)?;
    let verbose = query(params)?.verbose;
    Ok(Json(svc.get(&caller, id, verbose).await?))
}

#[tracing::instrument(skip_all, fields(catalog = C::ENTITY))]
pub async fn create_entry<C: Catalog>(
    Extension(svc): Extension<Arc<CatalogService<C>>>,
    Caller(caller): Caller,
    payload: Result<Json<NewElement<C::Kind>>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Element<C::Kind>>)> {
    let data = body(payload)?;
    let created = svc.create(&caller, data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[tracing::instrument(skip_all, fields(catalog = C::ENTITY))]
pub async fn update_entry<C: Catalog>(
    Extension(svc): Extension<Arc<CatalogService<C>>>,
    Caller(caller): Caller,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ElementPatch<C::Kind>>, JsonRejection>,
) -> ApiResult<Json<Element<C::Kind>>> {
    let id = path_id(id)?;
    let patch = body(payload)?;
    Ok(Json(svc.update(&caller, id, patch).await?))
}

#[tracing::instrument(skip_all, fields(catalog = C::ENTITY))]
pub async fn delete_entry<C: Catalog>(
    Extension(svc): Extension<Arc<CatalogService<C>>>,
    Caller(caller): Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = path_id(id)?;
    svc.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn user_login(
    Extension(accounts): Extension<Arc<AccountService>>,
    payload: Result<Json<UserCredentials>, JsonRejection>,
) -> ApiResult<Json<TokenPair>> {
    let req = body(payload)?;
    Ok(Json(accounts.user_login(&req.email, &req.password).await?))
}

pub async fn register_user(
    Extension(accounts): Extension<Arc<AccountService>>,
    Caller(caller): Caller,
    payload: Result<Json<UserCredentials>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    let req = body(payload)?;
    let account = accounts
        .register_user(&caller, &req.email, &req.password)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn admin_login(
    Extension(accounts): Extension<Arc<AccountService>>,
    payload: Result<Json<AdminLoginRequest>, JsonRejection>,
) -> ApiResult<Json<TokenPair>> {
    let req = body(payload)?;
    Ok(Json(accounts.admin_login(&req.username, &req.password).await?))
}

pub async fn admin_refresh(
    Extension(accounts): Extension<Arc<AccountService>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<TokenPair>> {
    let req = body(payload)?;
    Ok(Json(accounts.refresh_admin(&req.refresh_token).await?))
}

#[tracing::instrument(skip_all)]
pub async fn disable_admins(
    Extension(accounts): Extension<Arc<AccountService>>,
    Caller(caller): Caller,
    payload: Result<Json<DisableAdminsRequest>, JsonRejection>,
) -> ApiResult<Json<DisabledResponse>> {
    let req = body(payload)?;
    let disabled = accounts.disable_admins(&caller, req.ids).await?;
    Ok(Json(DisabledResponse { disabled }))
}
