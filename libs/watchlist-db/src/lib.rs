#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Data access for the watch-list service.
//!
//! Layers, bottom up:
//! - [`Db`] / [`Session`]: pooled connection and per-scope sessions with a
//!   lazily opened write transaction.
//! - [`query`]: field-checked select, count, insert, update, delete and bulk
//!   soft-delete statements over one entity.
//! - [`Repository`]: permission rules and visibility filters in front of the
//!   query layer.
//! - [`UnitOfWork`]: one session shared by a set of repositories, rolled back
//!   and closed on exit.

pub mod config;
pub mod error;
pub mod query;
pub mod repository;
pub mod session;
pub mod uow;
pub mod visibility;

pub use config::DatabaseConfig;
pub use error::{ConfigurationError, DbError, QueryError, RepositoryError};
pub use query::{
    ChangeOptions, CountQuery, DisableFieldType, DisableRequest, EntityQuery, FieldValues,
    FilterOperator, FilterSpec, IntoFieldValues, ItemQuery, JoinKind, JoinSpec, ListQuery,
    NoneFields, OrderBy, SelectOption, SortDirection,
};
pub use repository::{Access, Repository, SelectMode, check_binding};
pub use session::{Db, Session};
pub use uow::{RepositorySet, Scope, UnitOfWork};
pub use visibility::VisibilityFilter;

pub use sea_orm;
