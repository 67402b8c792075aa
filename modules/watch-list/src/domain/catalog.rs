//! Watch-list catalogs: listing, counting and editing anime and Kinopoisk
//! entries on behalf of a caller.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use watchlist_db::query::conditions_for;
use watchlist_db::{
    Access, ChangeOptions, CountQuery, Db, FilterSpec, IntoFieldValues, ItemQuery, ListQuery,
    NoneFields, OrderBy, Repository, SelectMode,
};
use watchlist_security::{CallerContext, Operation};

use super::error::DomainError;
use super::models::{
    AnimeKind, CLEARABLE_FIELDS, Element, ElementPatch, KinopoiskKind, NAME_MAX_LEN, NewElement,
    SCORE_RANGE,
};
use crate::infra::storage::{
    AnimeRepository, KinopoiskRepository, WatchListRepositories, WatchListUnitOfWork,
};

/// Fields matched by the free-text `search` parameter.
pub const SEARCH_FIELDS: [&str; 2] = ["name", "native_name"];

/// One watch-list table and the repository serving it.
pub trait Catalog: Sized + Send + Sync + 'static {
    type Repo: Repository;
    type Kind: Into<sea_orm::Value> + Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Entity name used in errors and logs.
    const ENTITY: &'static str;

    fn repo(repos: &WatchListRepositories) -> &Self::Repo;

    fn element(model: Model<Self>) -> Element<Self::Kind>;
}

type Model<C> = <<C as Catalog>::Repo as Repository>::Model;
type Entity<C> = <<C as Catalog>::Repo as Repository>::Entity;

pub struct AnimeCatalog;

impl Catalog for AnimeCatalog {
    type Repo = AnimeRepository;
    type Kind = AnimeKind;

    const ENTITY: &'static str = "anime";

    fn repo(repos: &WatchListRepositories) -> &AnimeRepository {
        &repos.anime
    }

    fn element(model: Model<Self>) -> Element<AnimeKind> {
        model.into()
    }
}

pub struct KinopoiskCatalog;

impl Catalog for KinopoiskCatalog {
    type Repo = KinopoiskRepository;
    type Kind = KinopoiskKind;

    const ENTITY: &'static str = "kinopoisk";

    fn repo(repos: &WatchListRepositories) -> &KinopoiskRepository {
        &repos.kinopoisk
    }

    fn element(model: Model<Self>) -> Element<KinopoiskKind> {
        model.into()
    }
}

/// Listing parameters as accepted from API callers.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub filters: Vec<FilterSpec>,
    pub search: Option<String>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub verbose: bool,
}

impl ListParams {
    fn select_mode(&self) -> SelectMode {
        if self.verbose {
            SelectMode::Verbose
        } else {
            SelectMode::Brief
        }
    }
}

pub struct CatalogService<C: Catalog> {
    db: Db,
    _catalog: PhantomData<C>,
}

impl<C: Catalog> Clone for CatalogService<C> {
    fn clone(&self) -> Self {
        Self::new(self.db.clone())
    }
}

impl<C: Catalog> CatalogService<C> {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            _catalog: PhantomData,
        }
    }

    fn uow(&self) -> WatchListUnitOfWork {
        WatchListUnitOfWork::new(self.db.clone())
    }

    /// Visible entries matching `params`.
    ///
    /// # Errors
    /// - `DomainError::Filter` / `DomainError::FilterField` for bad filters,
    ///   search fields or ordering.
    /// - `DomainError::Repository` when the caller may not list entries.
    #[tracing::instrument(skip(self, params), fields(catalog = C::ENTITY, mode = %caller.mode()))]
    pub async fn list(
        &self,
        caller: &CallerContext,
        params: ListParams,
    ) -> Result<Vec<Element<C::Kind>>, DomainError> {
        let select_mode = params.select_mode();
        let mut query = ListQuery {
            filters: conditions_for::<Entity<C>>(&params.filters)?,
            order_by: params.order_by,
            limit: params.limit,
            offset: params.offset,
            ..ListQuery::default()
        };
        if let Some(needle) = params.search.filter(|s| !s.trim().is_empty()) {
            query = query.search(needle, SEARCH_FIELDS);
        }
        let access = Access::from(caller);

        let models = self
            .uow()
            .run(|scope| async move {
                let items = C::repo(&scope.repositories)
                    .list(query, select_mode, access)
                    .await?;
                Ok::<_, DomainError>(items)
            })
            .await?;
        Ok(models.into_iter().map(C::element).collect())
    }

    /// Number of visible entries matching `filters`.
    ///
    /// # Errors
    /// Same as [`CatalogService::list`].
    pub async fn count(
        &self,
        caller: &CallerContext,
        filters: &[FilterSpec],
    ) -> Result<u64, DomainError> {
        let query = CountQuery {
            filters: conditions_for::<Entity<C>>(filters)?,
            ..CountQuery::default()
        };
        let access = Access::from(caller);
        self.uow()
            .run(|scope| async move {
                let n = C::repo(&scope.repositories).count(query, access).await?;
                Ok::<_, DomainError>(n)
            })
            .await
    }

    /// # Errors
    /// `DomainError::NotFound` when no visible entry has `id`.
    pub async fn get(
        &self,
        caller: &CallerContext,
        id: Uuid,
        verbose: bool,
    ) -> Result<Element<C::Kind>, DomainError> {
        let select_mode = if verbose {
            SelectMode::Verbose
        } else {
            SelectMode::Brief
        };
        let access = Access::from(caller);
        let found = self
            .uow()
            .run(|scope| async move {
                let item = C::repo(&scope.repositories)
                    .get(id.into(), ItemQuery::default(), select_mode, access)
                    .await?;
                Ok::<_, DomainError>(item)
            })
            .await?;
        found
            .map(C::element)
            .ok_or_else(|| DomainError::not_found(C::ENTITY, id))
    }

    /// # Errors
    /// - `DomainError::Validation` for out-of-range values.
    /// - `DomainError::Repository` when the caller may not create entries.
    pub async fn create(
        &self,
        caller: &CallerContext,
        data: NewElement<C::Kind>,
    ) -> Result<Element<C::Kind>, DomainError> {
        validate_values(data.name.as_deref(), data.native_name.as_deref(), data.score)?;
        let access = Access::from(caller);

        let model = self
            .uow()
            .run(|scope| async move {
                let item = C::repo(&scope.repositories)
                    .create(data.into_field_values(), true, access)
                    .await?;
                scope.session.commit().await?;
                Ok::<_, DomainError>(item)
            })
            .await?;
        let element = C::element(model);
        tracing::info!(catalog = C::ENTITY, id = %element.id, "entry created");
        Ok(element)
    }

    /// Apply `patch` to entry `id`.
    ///
    /// The update permission is checked before the entry is looked up, so a
    /// caller without it learns nothing about which ids exist.
    ///
    /// # Errors
    /// - `DomainError::Validation` for out-of-range values or a field in
    ///   `clear` that cannot be nulled.
    /// - `DomainError::NotFound` when the entry does not exist.
    /// - `DomainError::Repository` when the caller may not update entries.
    pub async fn update(
        &self,
        caller: &CallerContext,
        id: Uuid,
        mut patch: ElementPatch<C::Kind>,
    ) -> Result<Element<C::Kind>, DomainError> {
        validate_values(
            patch.name.as_deref(),
            patch.native_name.as_deref(),
            patch.score,
        )?;
        let clear = std::mem::take(&mut patch.clear);
        if let Some(field) = clear
            .iter()
            .find(|f| !CLEARABLE_FIELDS.contains(&f.as_str()))
        {
            return Err(DomainError::validation(
                field.as_str(),
                "field cannot be cleared",
            ));
        }
        let access = Access::from(caller);

        let (updated, model) = self
            .uow()
            .run(|scope| async move {
                let repo = C::repo(&scope.repositories);
                repo.check_permission(Operation::Update, access)?;
                let item = repo
                    .get(id.into(), ItemQuery::default(), SelectMode::Brief, access)
                    .await?
                    .ok_or_else(|| DomainError::not_found(C::ENTITY, id))?;
                let opts = ChangeOptions::default()
                    .set_none(NoneFields::only(clear))
                    .staged();
                let out = repo
                    .update(patch.into_field_values(), item, opts, access)
                    .await?;
                scope.session.commit().await?;
                Ok::<_, DomainError>(out)
            })
            .await?;
        tracing::info!(catalog = C::ENTITY, %id, updated, "entry updated");
        Ok(C::element(model))
    }

    /// # Errors
    /// - `DomainError::NotFound` when the entry does not exist.
    /// - `DomainError::DeleteFailed` when the store refused the delete.
    /// - `DomainError::Repository` when the caller may not delete entries.
    pub async fn delete(&self, caller: &CallerContext, id: Uuid) -> Result<(), DomainError> {
        let access = Access::from(caller);
        let deleted = self
            .uow()
            .run(|scope| async move {
                let repo = C::repo(&scope.repositories);
                repo.check_permission(Operation::Delete, access)?;
                let item = repo
                    .get(id.into(), ItemQuery::default(), SelectMode::Brief, access)
                    .await?
                    .ok_or_else(|| DomainError::not_found(C::ENTITY, id))?;
                let deleted = repo.delete(item, true, access).await?;
                if deleted {
                    scope.session.commit().await?;
                }
                Ok::<_, DomainError>(deleted)
            })
            .await?;
        if !deleted {
            return Err(DomainError::DeleteFailed {
                entity: C::ENTITY,
                id: id.to_string(),
            });
        }
        tracing::info!(catalog = C::ENTITY, %id, "entry deleted");
        Ok(())
    }
}

fn validate_values(
    name: Option<&str>,
    native_name: Option<&str>,
    score: Option<i16>,
) -> Result<(), DomainError> {
    for (field, value) in [("name", name), ("native_name", native_name)] {
        if value.is_some_and(|v| v.chars().count() > NAME_MAX_LEN) {
            return Err(DomainError::validation(
                field,
                format!("exceeds maximum length of {NAME_MAX_LEN}"),
            ));
        }
    }
    if let Some(score) = score
        && !SCORE_RANGE.contains(&score)
    {
        return Err(DomainError::validation(
            "score",
            format!(
                "must be between {} and {}",
                SCORE_RANGE.start(),
                SCORE_RANGE.end()
            ),
        ));
    }
    Ok(())
}
