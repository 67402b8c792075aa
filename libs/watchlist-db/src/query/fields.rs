use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{Condition, EntityTrait, IdenStatic, Iterable};

use crate::error::QueryError;

/// Table name of `E`, used as the model name in errors and logs.
#[must_use]
pub fn model_name<E: EntityTrait>() -> String {
    E::default().table_name().to_owned()
}

/// Resolve `field` to a column of `E`.
///
/// # Errors
/// Returns `QueryError::UnknownField` if `E` has no column named `field`.
pub fn resolve_column<E: EntityTrait>(field: &str) -> Result<E::Column, QueryError> {
    E::Column::iter()
        .find(|c| c.as_str() == field)
        .ok_or_else(|| QueryError::unknown_field(&model_name::<E>(), field))
}

/// Escape `\`, `%` and `_` so they match literally inside a `LIKE ... ESCAPE '\'` pattern.
#[must_use]
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn contains_ignore_case<E: EntityTrait>(column: E::Column, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
    Expr::expr(Func::lower(Expr::col((E::default(), column))))
        .like(LikeExpr::new(pattern).escape('\\'))
}

/// Case-insensitive "contains" match of `search` against any of the `search_by` fields.
///
/// # Errors
/// Returns `QueryError::UnknownField` if a name in `search_by` is not a column of `E`.
pub fn search_condition<E: EntityTrait>(
    search: &str,
    search_by: &[String],
) -> Result<Condition, QueryError> {
    search_by.iter().try_fold(Condition::any(), |cond, field| {
        let column = resolve_column::<E>(field)?;
        Ok(cond.add(contains_ignore_case::<E>(column, search)))
    })
}
