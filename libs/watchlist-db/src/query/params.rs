//! Parameters of the query-layer operations.

use sea_orm::sea_query::ColumnType;
use sea_orm::{ColumnTrait, Condition, EntityTrait, Order, Value};

use crate::error::QueryError;
use crate::query::fields::{model_name, resolve_column};
use crate::query::join::{JoinSpec, SelectOption};

/// Lookup of one record by an identity field.
#[derive(Debug)]
pub struct ItemQuery {
    pub identity_field: String,
    pub filters: Vec<Condition>,
    pub joins: Vec<JoinSpec>,
    pub options: Vec<SelectOption>,
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            identity_field: "id".to_owned(),
            filters: Vec::new(),
            joins: Vec::new(),
            options: Vec::new(),
        }
    }
}

impl ItemQuery {
    /// Look the record up by `field` instead of `id`.
    #[must_use]
    pub fn by_field(field: impl Into<String>) -> Self {
        Self {
            identity_field: field.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn filter(mut self, cond: Condition) -> Self {
        self.filters.push(cond);
        self
    }

    #[must_use]
    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    #[must_use]
    pub fn option(mut self, option: SelectOption) -> Self {
        self.options.push(option);
        self
    }
}

#[derive(Debug, Default)]
pub struct CountQuery {
    pub joins: Vec<JoinSpec>,
    pub filters: Vec<Condition>,
}

impl CountQuery {
    #[must_use]
    pub fn filter(mut self, cond: Condition) -> Self {
        self.filters.push(cond);
        self
    }

    #[must_use]
    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl From<SortDirection> for Order {
    fn from(d: SortDirection) -> Self {
        match d {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse `field` or `-field` (descending).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(field) => Self::desc(field),
            None => Self::asc(raw.strip_prefix('+').unwrap_or(raw)),
        }
    }
}

/// Filtered, searched, ordered and paginated listing.
#[derive(Debug, Default)]
pub struct ListQuery {
    pub joins: Vec<JoinSpec>,
    pub options: Vec<SelectOption>,
    pub filters: Vec<Condition>,
    pub search: Option<String>,
    pub search_by: Vec<String>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ListQuery {
    #[must_use]
    pub fn filter(mut self, cond: Condition) -> Self {
        self.filters.push(cond);
        self
    }

    #[must_use]
    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    #[must_use]
    pub fn option(mut self, option: SelectOption) -> Self {
        self.options.push(option);
        self
    }

    /// Case-insensitive substring search over `fields`.
    #[must_use]
    pub fn search<I, S>(mut self, needle: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search = Some(needle.into());
        self.search_by = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    #[must_use]
    pub fn paginate(mut self, limit: Option<u64>, offset: Option<u64>) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// Value written by a soft delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisableFieldType {
    /// Set to `true`; "not yet disabled" means `false`.
    Boolean,
    /// Set to the current UTC time; "not yet disabled" means null.
    Timestamp,
}

impl DisableFieldType {
    /// Infer the kind from the declared type of `field` on `E`.
    ///
    /// # Errors
    /// - `QueryError::UnknownField` if `field` is not a column of `E`.
    /// - `QueryError::DisableFieldType` if the column is neither boolean nor a timestamp.
    pub fn from_column<E: EntityTrait>(field: &str) -> Result<Self, QueryError> {
        let column = resolve_column::<E>(field)?;
        match column.def().get_column_type() {
            ColumnType::Boolean => Ok(Self::Boolean),
            ColumnType::DateTime | ColumnType::Timestamp | ColumnType::TimestampWithTimeZone => {
                Ok(Self::Timestamp)
            }
            _ => Err(QueryError::DisableFieldType {
                model: model_name::<E>(),
                field: field.to_owned(),
            }),
        }
    }
}

/// Bulk soft delete of the records whose `id_field` is in `ids`.
#[derive(Debug, Clone)]
pub struct DisableRequest {
    pub ids: Vec<Value>,
    pub id_field: String,
    pub disable_field: String,
    pub field_type: DisableFieldType,
    /// Only touch records that are not disabled yet.
    pub allow_filter_by_value: bool,
    pub extra_filters: Vec<Condition>,
    pub use_flush: bool,
}

impl DisableRequest {
    #[must_use]
    pub fn new<I, V>(ids: I, disable_field: impl Into<String>, field_type: DisableFieldType) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            id_field: "id".to_owned(),
            disable_field: disable_field.into(),
            field_type,
            allow_filter_by_value: true,
            extra_filters: Vec::new(),
            use_flush: false,
        }
    }

    #[must_use]
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Also rewrite records that are already disabled.
    #[must_use]
    pub fn overwrite(mut self) -> Self {
        self.allow_filter_by_value = false;
        self
    }

    #[must_use]
    pub fn filter(mut self, cond: Condition) -> Self {
        self.extra_filters.push(cond);
        self
    }

    #[must_use]
    pub fn staged(mut self) -> Self {
        self.use_flush = true;
        self
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn order_by_parses_prefix() {
        assert_eq!(OrderBy::parse("-score"), OrderBy::desc("score"));
        assert_eq!(OrderBy::parse("+name"), OrderBy::asc("name"));
        assert_eq!(OrderBy::parse("name"), OrderBy::asc("name"));
    }

    #[test]
    fn disable_request_defaults() {
        let req = DisableRequest::new([1_i32, 2], "disabled", DisableFieldType::Boolean);
        assert_eq!(req.id_field, "id");
        assert!(req.allow_filter_by_value);
        assert!(!req.use_flush);
        assert_eq!(req.ids.len(), 2);
    }
}
