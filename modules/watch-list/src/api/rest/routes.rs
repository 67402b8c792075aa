use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router, middleware};
use tower_http::trace::TraceLayer;
use watchlist_auth::TokenCodec;
use watchlist_db::Db;

use super::{auth, handlers};
use crate::domain::{AccountService, AnimeCatalog, Catalog, CatalogService, KinopoiskCatalog};

pub const API_PREFIX: &str = "/api/v1";

/// Services behind the REST API.
#[derive(Clone)]
pub struct AppServices {
    pub anime: Arc<CatalogService<AnimeCatalog>>,
    pub kinopoisk: Arc<CatalogService<KinopoiskCatalog>>,
    pub accounts: Arc<AccountService>,
}

impl AppServices {
    #[must_use]
    pub fn new(db: &Db, tokens: TokenCodec) -> Self {
        Self {
            anime: Arc::new(CatalogService::new(db.clone())),
            kinopoisk: Arc::new(CatalogService::new(db.clone())),
            accounts: Arc::new(AccountService::new(db.clone(), tokens)),
        }
    }
}

fn catalog_routes<C: Catalog>(service: Arc<CatalogService<C>>) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::list_entries::<C>).post(handlers::create_entry::<C>),
        )
        .route("/count", get(handlers::count_entries::<C>))
        .route(
            "/{id}",
            get(handlers::get_entry::<C>)
                .patch(handlers::update_entry::<C>)
                .delete(handlers::delete_entry::<C>),
        )
        .layer(Extension(service))
}

/// The full API under [`API_PREFIX`].
#[must_use]
pub fn router(services: &AppServices) -> Router {
    let api = Router::new()
        .nest("/anime", catalog_routes(services.anime.clone()))
        .nest("/kinopoisk", catalog_routes(services.kinopoisk.clone()))
        .route("/auth/login", post(handlers::user_login))
        .route("/users", post(handlers::register_user))
        .route("/admin/login", post(handlers::admin_login))
        .route("/admin/refresh", post(handlers::admin_refresh))
        .route("/admin/admins/disable", post(handlers::disable_admins))
        .layer(middleware::from_fn_with_state(
            services.accounts.clone(),
            auth::authenticate,
        ))
        .layer(Extension(services.accounts.clone()));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
}
