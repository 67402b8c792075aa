//! Query layer: filtered, joined and paginated statements over one entity.
//!
//! Every operation runs through a [`Session`](crate::Session). Field names are
//! resolved against the entity's columns before any statement reaches the
//! store, so a misspelled field is reported as
//! [`QueryError::UnknownField`](crate::QueryError::UnknownField) with no I/O.

pub mod data;
pub mod fields;
pub mod filter;
pub mod join;
pub mod ops;
pub mod params;

pub use data::{ChangeOptions, FieldValues, IntoFieldValues, NoneFields};
pub use fields::{escape_like, model_name, resolve_column};
pub use filter::{FilterOperator, FilterSpec, conditions_for, parse_filters};
pub use join::{JoinKind, JoinSpec, SelectOption};
pub use ops::EntityQuery;
pub use params::{
    CountQuery, DisableFieldType, DisableRequest, ItemQuery, ListQuery, OrderBy, SortDirection,
};
