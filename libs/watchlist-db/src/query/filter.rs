//! Field filters submitted by API callers.
//!
//! A [`FilterSpec`] names a field, an operator and a JSON value. The value is
//! converted to a typed store value using the column's declared type, then the
//! operator is looked up in a dispatch table and turned into a `Condition`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::{ColumnType, Expr, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, EntityTrait, Value};
use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::query::fields::resolve_column;

/// Comparison operator of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    /// Inclusive range; the value must be a two-element array.
    #[serde(rename = "between")]
    Between,
    /// Set membership; the value is an array (a scalar is a one-element set).
    #[serde(rename = "contains")]
    Contains,
}

impl FilterOperator {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThanOrEqual => "<=",
            Self::Between => "between",
            Self::Contains => "contains",
        }
    }
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OPERATOR_TABLE
            .iter()
            .find(|(op, _)| op.as_str() == s)
            .map(|(op, _)| *op)
            .ok_or_else(|| format!("unknown operator '{s}'"))
    }
}

/// Right-hand side of a filter after type conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Null,
    Scalar(Value),
    List(Vec<Value>),
}

type OperatorFn = fn(Expr, Operand) -> Result<SimpleExpr, String>;

/// Operator -> condition builder.
const OPERATOR_TABLE: [(FilterOperator, OperatorFn); 7] = [
    (FilterOperator::Equals, op_eq),
    (FilterOperator::GreaterThan, op_gt),
    (FilterOperator::LessThan, op_lt),
    (FilterOperator::GreaterThanOrEqual, op_gte),
    (FilterOperator::LessThanOrEqual, op_lte),
    (FilterOperator::Between, op_between),
    (FilterOperator::Contains, op_contains),
];

fn dispatch(op: FilterOperator) -> OperatorFn {
    OPERATOR_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == op)
        .map_or(op_unsupported as OperatorFn, |(_, f)| *f)
}

fn op_unsupported(_: Expr, _: Operand) -> Result<SimpleExpr, String> {
    Err("operator is not supported".to_owned())
}

fn scalar(operand: Operand) -> Result<Value, String> {
    match operand {
        Operand::Scalar(v) => Ok(v),
        Operand::Null => Err("null cannot be compared".to_owned()),
        Operand::List(_) => Err("operator expects a single value".to_owned()),
    }
}

fn op_eq(col: Expr, operand: Operand) -> Result<SimpleExpr, String> {
    match operand {
        Operand::Null => Ok(col.is_null()),
        other => Ok(col.eq(scalar(other)?)),
    }
}

fn op_gt(col: Expr, operand: Operand) -> Result<SimpleExpr, String> {
    Ok(col.gt(scalar(operand)?))
}

fn op_lt(col: Expr, operand: Operand) -> Result<SimpleExpr, String> {
    Ok(col.lt(scalar(operand)?))
}

fn op_gte(col: Expr, operand: Operand) -> Result<SimpleExpr, String> {
    Ok(col.gte(scalar(operand)?))
}

fn op_lte(col: Expr, operand: Operand) -> Result<SimpleExpr, String> {
    Ok(col.lte(scalar(operand)?))
}

fn op_between(col: Expr, operand: Operand) -> Result<SimpleExpr, String> {
    match operand {
        Operand::List(values) => match <[Value; 2]>::try_from(values) {
            Ok([low, high]) => Ok(col.between(low, high)),
            Err(values) => Err(format!(
                "between expects exactly 2 values, got {}",
                values.len()
            )),
        },
        _ => Err("between expects an array of 2 values".to_owned()),
    }
}

fn op_contains(col: Expr, operand: Operand) -> Result<SimpleExpr, String> {
    match operand {
        Operand::List(values) => Ok(col.is_in(values)),
        Operand::Scalar(v) => Ok(col.is_in([v])),
        Operand::Null => Err("contains expects an array of values".to_owned()),
    }
}

/// Convert one JSON scalar to a store value matching `column_type`.
fn convert_scalar(
    column_type: &ColumnType,
    value: &serde_json::Value,
) -> Result<Value, String> {
    use serde_json::Value as J;

    let mismatch = || format!("value {value} does not match the field type");
    match column_type {
        ColumnType::Boolean => value.as_bool().map(Value::from).ok_or_else(mismatch),
        ColumnType::TinyInteger
        | ColumnType::SmallInteger
        | ColumnType::Integer
        | ColumnType::BigInteger
        | ColumnType::TinyUnsigned
        | ColumnType::SmallUnsigned
        | ColumnType::Unsigned
        | ColumnType::BigUnsigned => value.as_i64().map(Value::from).ok_or_else(mismatch),
        ColumnType::Float | ColumnType::Double | ColumnType::Decimal(_) => {
            value.as_f64().map(Value::from).ok_or_else(mismatch)
        }
        ColumnType::Uuid => value
            .as_str()
            .and_then(|s| uuid::Uuid::parse_str(s).ok())
            .map(Value::from)
            .ok_or_else(mismatch),
        ColumnType::DateTime | ColumnType::Timestamp | ColumnType::TimestampWithTimeZone => {
            value
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| Value::from(dt.with_timezone(&Utc)))
                .ok_or_else(mismatch)
        }
        ColumnType::Date => value
            .as_str()
            .and_then(|s| NaiveDate::from_str(s).ok())
            .map(Value::from)
            .ok_or_else(mismatch),
        _ => match value {
            J::String(s) => Ok(Value::from(s.clone())),
            J::Number(n) => Ok(Value::from(n.to_string())),
            J::Bool(b) => Ok(Value::from(b.to_string())),
            _ => Err(mismatch()),
        },
    }
}

fn convert_operand(column_type: &ColumnType, value: &serde_json::Value) -> Result<Operand, String> {
    match value {
        serde_json::Value::Null => Ok(Operand::Null),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| convert_scalar(column_type, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Operand::List),
        other => convert_scalar(column_type, other).map(Operand::Scalar),
    }
}

/// One `{field, value, operator}` filter as submitted by API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSpec {
    pub field: String,
    pub value: serde_json::Value,
    pub operator: FilterOperator,
}

impl FilterSpec {
    #[must_use]
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: serde_json::Value) -> Self {
        Self {
            field: field.into(),
            value,
            operator,
        }
    }

    /// Build the condition this filter stands for on entity `E`.
    ///
    /// # Errors
    /// - `QueryError::UnknownField` if `field` is not a column of `E`.
    /// - `QueryError::InvalidFilter` if the value does not fit the column or the operator.
    pub fn to_condition<E: EntityTrait>(&self) -> Result<Condition, QueryError> {
        let column = resolve_column::<E>(&self.field)?;
        let column_def = column.def();
        let operand = convert_operand(column_def.get_column_type(), &self.value)
            .map_err(|reason| QueryError::invalid_filter(&self.field, reason))?;
        let expr = dispatch(self.operator)(Expr::col((E::default(), column)), operand)
            .map_err(|reason| QueryError::invalid_filter(&self.field, reason))?;
        Ok(Condition::all().add(expr))
    }
}

/// Parse a `filters` query parameter: one filter object or an array of them.
///
/// # Errors
/// Returns the JSON error message if the text is not a filter or a list of filters.
pub fn parse_filters(raw: &str) -> Result<Vec<FilterSpec>, String> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<FilterSpec>),
        One(FilterSpec),
    }

    match serde_json::from_str::<OneOrMany>(raw) {
        Ok(OneOrMany::Many(filters)) => Ok(filters),
        Ok(OneOrMany::One(filter)) => Ok(vec![filter]),
        Err(e) => Err(e.to_string()),
    }
}

/// AND of every filter in `specs`.
///
/// # Errors
/// Returns the first error produced by [`FilterSpec::to_condition`].
pub fn conditions_for<E: EntityTrait>(specs: &[FilterSpec]) -> Result<Vec<Condition>, QueryError> {
    specs.iter().map(FilterSpec::to_condition::<E>).collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_operator_has_a_table_entry() {
        for op in [
            FilterOperator::Equals,
            FilterOperator::GreaterThan,
            FilterOperator::LessThan,
            FilterOperator::GreaterThanOrEqual,
            FilterOperator::LessThanOrEqual,
            FilterOperator::Between,
            FilterOperator::Contains,
        ] {
            assert!(OPERATOR_TABLE.iter().any(|(o, _)| *o == op), "{op:?}");
            assert_eq!(op.as_str().parse::<FilterOperator>().unwrap(), op);
        }
        assert!("~".parse::<FilterOperator>().is_err());
    }

    #[test]
    fn between_requires_two_values() {
        let col = Expr::col(sea_orm::sea_query::Alias::new("score"));
        let three = Operand::List(vec![1.into(), 2.into(), 3.into()]);
        let err = dispatch(FilterOperator::Between)(col.clone(), three).unwrap_err();
        assert!(err.contains("exactly 2"), "{err}");

        let two = Operand::List(vec![1.into(), 2.into()]);
        assert!(dispatch(FilterOperator::Between)(col, two).is_ok());
    }

    #[test]
    fn parse_accepts_one_or_many() {
        let one = parse_filters(r#"{"field":"score","value":10,"operator":">="}"#).unwrap();
        assert_eq!(
            one,
            vec![FilterSpec::new("score", FilterOperator::GreaterThanOrEqual, json!(10))]
        );

        let many = parse_filters(
            r#"[{"field":"score","value":[1,5],"operator":"between"},
                {"field":"status","value":["WATCHED"],"operator":"contains"}]"#,
        )
        .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].operator, FilterOperator::Contains);

        assert!(parse_filters(r#"{"field":"score","value":1,"operator":"~"}"#).is_err());
        assert!(parse_filters("not json").is_err());
    }

    #[test]
    fn scalar_conversion_follows_column_type() {
        assert_eq!(
            convert_scalar(&ColumnType::Boolean, &json!(true)).unwrap(),
            Value::from(true)
        );
        assert!(convert_scalar(&ColumnType::Integer, &json!("ten")).is_err());
        assert!(convert_scalar(&ColumnType::Uuid, &json!("not-a-uuid")).is_err());
        assert_eq!(
            convert_scalar(&ColumnType::Text, &json!("abc")).unwrap(),
            Value::from("abc".to_owned())
        );
    }
}
