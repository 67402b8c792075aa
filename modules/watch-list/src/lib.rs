#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Watch-list service: anime and Kinopoisk entries, admin and user accounts,
//! and the REST API over them.

pub mod api;
pub mod domain;
pub mod infra;

pub use api::rest::{AppServices, router};
pub use domain::{AccountService, CatalogService, DomainError};
pub use infra::storage::Migrator;
