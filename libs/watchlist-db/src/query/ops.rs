use std::marker::PhantomData;
use std::mem::discriminant;

use chrono::Utc;
use sea_orm::sea_query::{ColumnType, Expr};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Value,
};

use crate::error::{DbError, QueryError};
use crate::query::data::{ChangeOptions, IntoFieldValues};
use crate::query::fields::{model_name, resolve_column, search_condition};
use crate::query::join::{apply_joins, apply_options};
use crate::query::params::{CountQuery, DisableFieldType, DisableRequest, ItemQuery, ListQuery};
use crate::session::{Runner, Session, SessionState};

/// Whether `value` has the variant the store layer expects for `column_type`.
///
/// Combinations not listed are accepted and left to the store to judge.
fn value_fits(column_type: &ColumnType, value: &Value) -> bool {
    match column_type {
        ColumnType::Boolean => matches!(value, Value::Bool(_)),
        ColumnType::TinyInteger => matches!(value, Value::TinyInt(_)),
        ColumnType::SmallInteger => matches!(value, Value::SmallInt(_)),
        ColumnType::Integer => matches!(value, Value::Int(_)),
        ColumnType::BigInteger => matches!(value, Value::BigInt(_)),
        ColumnType::Float => matches!(value, Value::Float(_)),
        ColumnType::Double => matches!(value, Value::Double(_)),
        ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text => {
            matches!(value, Value::String(_) | Value::Char(_))
        }
        ColumnType::Uuid => matches!(value, Value::Uuid(_)),
        ColumnType::TimestampWithTimeZone => matches!(
            value,
            Value::ChronoDateTimeUtc(_)
                | Value::ChronoDateTimeWithTimeZone(_)
                | Value::ChronoDateTimeLocal(_)
        ),
        ColumnType::DateTime | ColumnType::Timestamp => matches!(
            value,
            Value::ChronoDateTime(_) | Value::ChronoDateTimeUtc(_)
        ),
        _ => true,
    }
}

/// Query-layer operations on entity `E`, bound to one [`Session`].
pub struct EntityQuery<E> {
    session: Session,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityQuery<E> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for EntityQuery<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityQuery")
            .field("entity", &std::any::type_name::<E>())
            .field("session", &self.session)
            .finish()
    }
}

async fn delete_in<M, A>(state: &mut SessionState, item: M, use_flush: bool) -> Result<(), DbError>
where
    M: ModelTrait + IntoActiveModel<A>,
    A: ActiveModelTrait<Entity = M::Entity> + ActiveModelBehavior + Send,
{
    let tx = state.writer().await?;
    item.delete(tx).await?;
    if !use_flush {
        state.commit().await?;
    }
    Ok(())
}

impl<E> EntityQuery<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
{
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// First record whose identity field equals `identity`, if any.
    ///
    /// # Errors
    /// - `QueryError::UnknownField` if `query.identity_field` is not a column of `E`;
    ///   raised before the store is touched.
    /// - `QueryError::Db` on store failure.
    pub async fn get_item(
        &self,
        identity: impl Into<Value>,
        query: ItemQuery,
    ) -> Result<Option<E::Model>, QueryError> {
        let identity_col = resolve_column::<E>(&query.identity_field)?;

        let mut select = apply_joins(E::find(), query.joins);
        select = apply_options(select, &query.options);
        for cond in query.filters {
            select = select.filter(cond);
        }
        let select = select.filter(identity_col.eq(identity.into()));

        let state = self.session.lock().await;
        let item = match state.reader()? {
            Runner::Conn(db) => select.one(db).await?,
            Runner::Tx(tx) => select.one(tx).await?,
        };
        Ok(item)
    }

    /// Number of records matching `query`.
    ///
    /// # Errors
    /// Returns `QueryError::Db` on store failure.
    pub async fn get_items_count(&self, query: CountQuery) -> Result<u64, QueryError> {
        let mut select = apply_joins(E::find(), query.joins);
        for cond in query.filters {
            select = select.filter(cond);
        }

        let state = self.session.lock().await;
        let count = match state.reader()? {
            Runner::Conn(db) => select.count(db).await?,
            Runner::Tx(tx) => select.count(tx).await?,
        };
        Ok(count)
    }

    /// Records matching `query`, ordered and paginated.
    ///
    /// # Errors
    /// - `QueryError::UnknownField` if a `search_by` or `order_by` name is not a column of `E`;
    ///   raised before the store is touched.
    /// - `QueryError::Db` on store failure.
    pub async fn get_item_list(&self, query: ListQuery) -> Result<Vec<E::Model>, QueryError> {
        let search = match query.search.as_deref() {
            Some(needle) if !needle.is_empty() && !query.search_by.is_empty() => {
                Some(search_condition::<E>(needle, &query.search_by)?)
            }
            _ => None,
        };
        let order = query
            .order_by
            .iter()
            .map(|o| Ok((resolve_column::<E>(&o.field)?, o.direction)))
            .collect::<Result<Vec<_>, QueryError>>()?;

        let mut select = apply_joins(E::find(), query.joins);
        select = apply_options(select, &query.options);
        if let Some(cond) = search {
            select = select.filter(cond);
        }
        for cond in query.filters {
            select = select.filter(cond);
        }
        for (column, direction) in order {
            select = select.order_by(column, direction.into());
        }
        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }
        if let Some(offset) = query.offset {
            select = select.offset(offset);
        }

        let state = self.session.lock().await;
        let items = match state.reader()? {
            Runner::Conn(db) => select.all(db).await?,
            Runner::Tx(tx) => select.all(tx).await?,
        };
        Ok(items)
    }

    /// Persist a new record built from `data`.
    ///
    /// Null entries are left unset so the column default applies. With
    /// `use_flush` the insert stays in the session transaction.
    ///
    /// # Errors
    /// - `QueryError::UnknownField` / `QueryError::FieldType` for bad `data`;
    ///   raised before the store is touched.
    /// - `QueryError::Db` on store failure.
    pub async fn create_item(
        &self,
        data: impl IntoFieldValues + Send,
        use_flush: bool,
    ) -> Result<E::Model, QueryError> {
        let data = data.into_field_values();
        let mut am = <E::ActiveModel as ActiveModelBehavior>::new();
        for (field, value) in data.iter() {
            let Some(value) = value else { continue };
            let column = resolve_column::<E>(field)?;
            if !value_fits(column.def().get_column_type(), value) {
                return Err(QueryError::FieldType {
                    model: model_name::<E>(),
                    field: field.to_owned(),
                });
            }
            am.set(column, value.clone());
        }

        let mut state = self.session.lock().await;
        let tx = state.writer().await?;
        let item = am.insert(tx).await?;
        if !use_flush {
            state.commit().await?;
        }
        tracing::debug!(
            model = %model_name::<E>(),
            staged = use_flush,
            "item created"
        );
        Ok(item)
    }

    /// Apply `data` to `item`.
    ///
    /// Returns whether any assigned field differs from its previous value,
    /// together with the current state of the record.
    ///
    /// # Errors
    /// - `QueryError::UnknownField` / `QueryError::FieldType` for bad `data`;
    ///   raised before the store is touched.
    /// - `QueryError::Db` on store failure.
    pub async fn change_item(
        &self,
        data: impl IntoFieldValues + Send,
        item: E::Model,
        opts: ChangeOptions,
    ) -> Result<(bool, E::Model), QueryError> {
        let data = data.into_field_values();
        let mut am = item.clone().into_active_model();
        let mut updated = false;
        for (field, value) in data.iter() {
            let column = resolve_column::<E>(field)?;
            let current = item.get(column);
            let next = match value {
                Some(v) if discriminant(v) == discriminant(&current) => v.clone(),
                Some(_) => {
                    return Err(QueryError::FieldType {
                        model: model_name::<E>(),
                        field: field.to_owned(),
                    });
                }
                None if opts.assigns_null(field) => current.as_null(),
                None => continue,
            };
            if !updated && next != current {
                updated = true;
            }
            am.set(column, next);
        }

        let mut state = self.session.lock().await;
        let item = if updated {
            let tx = state.writer().await?;
            am.update(tx).await?
        } else {
            state.ensure_open()?;
            item
        };
        if !opts.use_flush {
            state.commit().await?;
        }
        tracing::debug!(
            model = %model_name::<E>(),
            updated,
            set_none = opts.set_none,
            staged = opts.use_flush,
            "item changed"
        );
        Ok((updated, item))
    }

    /// Remove `item`. Returns `false` instead of failing when the store rejects the delete.
    ///
    /// On failure the session transaction is rolled back, discarding any other
    /// staged writes.
    pub async fn delete_item(&self, item: E::Model, use_flush: bool) -> bool {
        let mut state = self.session.lock().await;
        match delete_in::<E::Model, E::ActiveModel>(&mut state, item, use_flush).await {
            Ok(()) => {
                tracing::debug!(model = %model_name::<E>(), "item deleted");
                true
            }
            Err(e) => {
                if let Err(rollback_err) = state.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback after failed delete failed");
                }
                tracing::warn!(model = %model_name::<E>(), error = %e, "delete failed");
                false
            }
        }
    }

    /// Soft-delete every record listed in `req`. Returns the number of rows changed.
    ///
    /// An empty id list returns 0 without touching the store.
    ///
    /// # Errors
    /// - `QueryError::UnknownField` if `id_field` or `disable_field` is not a column of `E`.
    /// - `QueryError::Db` on store failure.
    pub async fn disable_items(&self, req: DisableRequest) -> Result<u64, QueryError> {
        if req.ids.is_empty() {
            return Ok(0);
        }
        let id_col = resolve_column::<E>(&req.id_field)?;
        let disable_col = resolve_column::<E>(&req.disable_field)?;

        let value: Value = match req.field_type {
            DisableFieldType::Boolean => true.into(),
            DisableFieldType::Timestamp => Utc::now().into(),
        };
        let mut update = E::update_many()
            .col_expr(disable_col, Expr::value(value))
            .filter(id_col.is_in(req.ids));
        if req.allow_filter_by_value {
            update = update.filter(match req.field_type {
                DisableFieldType::Boolean => disable_col.eq(false),
                DisableFieldType::Timestamp => disable_col.is_null(),
            });
        }
        for cond in req.extra_filters {
            update = update.filter(cond);
        }

        let mut state = self.session.lock().await;
        let tx = state.writer().await?;
        let affected = update.exec(tx).await?.rows_affected;
        if !req.use_flush {
            state.commit().await?;
        }
        tracing::debug!(
            model = %model_name::<E>(),
            field = %req.disable_field,
            affected,
            "items disabled"
        );
        Ok(affected)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use sea_orm::sea_query::StringLen;

    #[test]
    fn value_fits_checks_variant() {
        assert!(value_fits(&ColumnType::SmallInteger, &Value::from(5_i16)));
        assert!(!value_fits(&ColumnType::SmallInteger, &Value::from(5_i64)));
        assert!(value_fits(
            &ColumnType::String(StringLen::N(255)),
            &Value::from("x".to_owned())
        ));
        assert!(!value_fits(&ColumnType::Boolean, &Value::from(1_i32)));
        assert!(value_fits(&ColumnType::Json, &Value::from(1_i32)));
    }
}
