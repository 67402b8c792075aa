#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Shared fixtures: a migrated in-memory database and fast auth settings.

use sea_orm_migration::MigratorTrait;
use uuid::Uuid;
use watch_list::Migrator;
use watch_list::domain::models::{AnimeKind, NewElement, WatchStatus};
use watchlist_auth::{AuthConfig, TokenCodec};
use watchlist_db::{DatabaseConfig, Db};
use watchlist_security::CallerContext;

/// Fresh shared-cache in-memory database named `name` with the full schema.
pub async fn setup(name: &str) -> Db {
    let mut cfg = DatabaseConfig::from_url(format!("sqlite:file:{name}?mode=memory&cache=shared"));
    cfg.max_connections = 1;
    cfg.min_connections = Some(1);
    let db = Db::connect(&cfg).await.expect("Failed to connect to database");
    Migrator::up(db.connection(), None)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn codec() -> TokenCodec {
    TokenCodec::new(AuthConfig {
        bcrypt_cost: 4,
        ..AuthConfig::default()
    })
}

pub fn admin() -> CallerContext {
    CallerContext::admin(Uuid::new_v4())
}

pub fn user() -> CallerContext {
    CallerContext::user(Uuid::new_v4())
}

pub fn anime(name: &str, score: Option<i16>) -> NewElement<AnimeKind> {
    NewElement {
        name: Some(name.to_owned()),
        score,
        ..NewElement::default()
    }
}

pub fn watched(name: &str, native_name: &str, score: i16) -> NewElement<AnimeKind> {
    NewElement {
        name: Some(name.to_owned()),
        native_name: Some(native_name.to_owned()),
        score: Some(score),
        status: Some(WatchStatus::Watched),
        kind: Some(AnimeKind::Series),
        ..NewElement::default()
    }
}
