//! Permission-aware repositories.
//!
//! A [`Repository`] binds one sea-orm entity to an [`EntityQuery`] and guards
//! every operation with the repository's [`PermissionRules`]. Reads also apply
//! the row-level [`VisibilityFilter`] of the caller's mode.
//!
//! The entity binding is part of the type (`type Entity`), so a repository
//! without one does not compile. [`check_binding`] verifies the rest of the
//! contract when a unit of work builds its repositories.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, EntityName, EntityTrait, FromQueryResult,
    IntoActiveModel, Iterable, ModelTrait, PrimaryKeyToColumn, Value,
};
use watchlist_security::{CallerContext, Operation, PermissionMode, PermissionRules};

use crate::error::{ConfigurationError, RepositoryError};
use crate::query::{
    ChangeOptions, CountQuery, DisableRequest, EntityQuery, FieldValues, ItemQuery, ListQuery,
};
use crate::visibility::VisibilityFilter;

/// Whether reads honor caller-supplied joins and statement options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectMode {
    /// Joins and options are discarded.
    ///
    /// A visibility filter that needs a join is discarded along with them, so
    /// brief reads of such repositories are not row-restricted.
    #[default]
    Brief,
    Verbose,
}

/// Mode a repository call runs under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Access {
    pub mode: PermissionMode,
    /// Skip the permission check. Logged as a warning on every use.
    pub ignore_permissions: bool,
}

impl Access {
    #[must_use]
    pub fn new(mode: PermissionMode) -> Self {
        Self {
            mode,
            ignore_permissions: false,
        }
    }

    /// For trusted internal call sites that run before a caller mode exists.
    #[must_use]
    pub fn trusted() -> Self {
        Self {
            mode: PermissionMode::Anyone,
            ignore_permissions: true,
        }
    }
}

impl From<PermissionMode> for Access {
    fn from(mode: PermissionMode) -> Self {
        Self::new(mode)
    }
}

impl From<&CallerContext> for Access {
    fn from(ctx: &CallerContext) -> Self {
        Self::new(ctx.mode())
    }
}

#[async_trait]
pub trait Repository: Send + Sync {
    type Entity: EntityTrait<Model = Self::Model, ActiveModel = Self::ActiveModel>;
    type Model: ModelTrait<Entity = Self::Entity>
        + FromQueryResult
        + IntoActiveModel<Self::ActiveModel>
        + Sync;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + Send;

    /// Name used in logs and configuration errors.
    const NAME: &'static str;

    fn query(&self) -> &EntityQuery<Self::Entity>;

    /// Minimum mode per operation. Every operation is open to anyone by default.
    fn permission_rules(&self) -> PermissionRules {
        PermissionRules::default()
    }

    fn anon_visibility(&self, _operation: Operation) -> Result<VisibilityFilter, RepositoryError> {
        Err(RepositoryError::not_implemented(
            Self::NAME,
            "anonymous visibility filters",
        ))
    }

    fn user_visibility(&self, _operation: Operation) -> Result<VisibilityFilter, RepositoryError> {
        Err(RepositoryError::not_implemented(
            Self::NAME,
            "user visibility filters",
        ))
    }

    fn admin_visibility(&self, _operation: Operation) -> Result<VisibilityFilter, RepositoryError> {
        Err(RepositoryError::not_implemented(
            Self::NAME,
            "admin visibility filters",
        ))
    }

    /// # Errors
    /// Returns `RepositoryError::Permission` when `access` does not satisfy the rule for `operation`.
    fn check_permission(&self, operation: Operation, access: Access) -> Result<(), RepositoryError> {
        watchlist_security::check_permission(
            &self.permission_rules(),
            operation,
            access.mode,
            access.ignore_permissions,
            Self::NAME,
        )?;
        Ok(())
    }

    /// Check the permission for `operation`, then pick the visibility filter of `access.mode`.
    ///
    /// # Errors
    /// - `RepositoryError::Permission` when the check fails.
    /// - `RepositoryError::NotImplemented` when the mode's provider is missing.
    fn resolve_visibility_filter(
        &self,
        operation: Operation,
        access: Access,
    ) -> Result<VisibilityFilter, RepositoryError> {
        self.check_permission(operation, access)?;
        match access.mode {
            PermissionMode::Anon => self.anon_visibility(operation),
            PermissionMode::User => self.user_visibility(operation),
            PermissionMode::Admin => self.admin_visibility(operation),
            PermissionMode::Anyone | PermissionMode::NoOne => Ok(VisibilityFilter::none()),
        }
    }

    /// One record by identity, checked against `read_detail`.
    async fn get(
        &self,
        identity: Value,
        query: ItemQuery,
        select_mode: SelectMode,
        access: Access,
    ) -> Result<Option<Self::Model>, RepositoryError> {
        let visibility = self.resolve_visibility_filter(Operation::ReadDetail, access)?;
        let mut query = query;
        let mut filters = match select_mode {
            SelectMode::Brief => {
                query.joins.clear();
                query.options.clear();
                visibility.effective(0)
            }
            SelectMode::Verbose => visibility.filters,
        };
        filters.append(&mut query.filters);
        query.filters = filters;
        Ok(self.query().get_item(identity, query).await?)
    }

    /// Number of visible records, checked against `read_count`.
    async fn count(&self, query: CountQuery, access: Access) -> Result<u64, RepositoryError> {
        let visibility = self.resolve_visibility_filter(Operation::ReadCount, access)?;
        let mut query = query;
        query.filters.extend(visibility.effective(query.joins.len()));
        Ok(self.query().get_items_count(query).await?)
    }

    /// Visible records, checked against `read_list`.
    async fn list(
        &self,
        query: ListQuery,
        select_mode: SelectMode,
        access: Access,
    ) -> Result<Vec<Self::Model>, RepositoryError> {
        let visibility = self.resolve_visibility_filter(Operation::ReadList, access)?;
        let mut query = query;
        if select_mode == SelectMode::Brief {
            query.joins.clear();
            query.options.clear();
        }
        query.filters.extend(visibility.effective(query.joins.len()));
        Ok(self.query().get_item_list(query).await?)
    }

    async fn create(
        &self,
        data: FieldValues,
        use_flush: bool,
        access: Access,
    ) -> Result<Self::Model, RepositoryError> {
        self.check_permission(Operation::Create, access)?;
        Ok(self.query().create_item(data, use_flush).await?)
    }

    async fn update(
        &self,
        data: FieldValues,
        item: Self::Model,
        opts: ChangeOptions,
        access: Access,
    ) -> Result<(bool, Self::Model), RepositoryError> {
        self.check_permission(Operation::Update, access)?;
        Ok(self.query().change_item(data, item, opts).await?)
    }

    async fn disable(&self, req: DisableRequest, access: Access) -> Result<u64, RepositoryError> {
        self.check_permission(Operation::Disable, access)?;
        Ok(self.query().disable_items(req).await?)
    }

    /// Remove `item`. `Ok(false)` means the store refused the delete.
    async fn delete(
        &self,
        item: Self::Model,
        use_flush: bool,
        access: Access,
    ) -> Result<bool, RepositoryError> {
        self.check_permission(Operation::Delete, access)?;
        Ok(self.query().delete_item(item, use_flush).await)
    }
}

/// Validate the binding of repository `R` to its entity.
///
/// # Errors
/// Returns `ConfigurationError` when the name or table name is empty, or the
/// entity's primary key is not a single `id` column.
pub fn check_binding<R: Repository>() -> Result<(), ConfigurationError> {
    if R::NAME.trim().is_empty() {
        return Err(ConfigurationError::new(R::NAME, "repository name is empty"));
    }
    let table = R::Entity::default().table_name().to_owned();
    if table.is_empty() {
        return Err(ConfigurationError::new(R::NAME, "entity has no table name"));
    }

    let keys: Vec<String> = <R::Entity as EntityTrait>::PrimaryKey::iter()
        .map(|pk| sea_orm::IdenStatic::as_str(&pk.into_column()).to_owned())
        .collect();
    if keys != ["id"] {
        return Err(ConfigurationError::new(
            R::NAME,
            format!("entity '{table}' must have a single primary key 'id', found {keys:?}"),
        ));
    }

    tracing::debug!(repository = R::NAME, table = %table, "repository binding checked");
    Ok(())
}
