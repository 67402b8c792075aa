#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Shared fixtures: two small entities, their tables and a repository over them.

use sea_orm::{Condition, entity::prelude::*};
use sea_orm_migration::prelude as mig;
use watchlist_db::{
    DatabaseConfig, Db, EntityQuery, FieldValues, Repository, RepositoryError, Session,
    VisibilityFilter,
};
use watchlist_security::{Operation, PermissionRules};

pub mod owner {
    use sea_orm::entity::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "owners")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        pub active: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::item::Entity")]
        Items,
    }

    impl Related<super::item::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Items.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod item {
    use sea_orm::entity::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "items")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        pub note: Option<String>,
        pub score: Option<i16>,
        pub disabled: bool,
        pub disabled_at: Option<DateTimeUtc>,
        pub owner_id: Option<i32>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::owner::Entity",
            from = "Column::OwnerId",
            to = "super::owner::Column::Id"
        )]
        Owner,
    }

    impl Related<super::owner::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Owner.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Entity whose primary key is not `id`.
pub mod tag {
    use sea_orm::entity::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "tags")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub code: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

struct CreateOwners;

impl mig::MigrationName for CreateOwners {
    fn name(&self) -> &'static str {
        "m001_create_owners"
    }
}

#[async_trait::async_trait]
impl mig::MigrationTrait for CreateOwners {
    async fn up(&self, manager: &mig::SchemaManager) -> Result<(), mig::DbErr> {
        manager
            .create_table(
                mig::Table::create()
                    .table(mig::Alias::new("owners"))
                    .if_not_exists()
                    .col(
                        mig::ColumnDef::new(mig::Alias::new("id"))
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        mig::ColumnDef::new(mig::Alias::new("name"))
                            .string()
                            .not_null(),
                    )
                    .col(
                        mig::ColumnDef::new(mig::Alias::new("active"))
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await
    }
}

struct CreateItems;

impl mig::MigrationName for CreateItems {
    fn name(&self) -> &'static str {
        "m002_create_items"
    }
}

#[async_trait::async_trait]
impl mig::MigrationTrait for CreateItems {
    async fn up(&self, manager: &mig::SchemaManager) -> Result<(), mig::DbErr> {
        manager
            .create_table(
                mig::Table::create()
                    .table(mig::Alias::new("items"))
                    .if_not_exists()
                    .col(
                        mig::ColumnDef::new(mig::Alias::new("id"))
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        mig::ColumnDef::new(mig::Alias::new("name"))
                            .string()
                            .not_null(),
                    )
                    .col(mig::ColumnDef::new(mig::Alias::new("note")).text().null())
                    .col(
                        mig::ColumnDef::new(mig::Alias::new("score"))
                            .small_integer()
                            .null(),
                    )
                    .col(
                        mig::ColumnDef::new(mig::Alias::new("disabled"))
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        mig::ColumnDef::new(mig::Alias::new("disabled_at"))
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        mig::ColumnDef::new(mig::Alias::new("owner_id"))
                            .integer()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }
}

/// Fresh shared-cache in-memory database named `name`, with both tables created.
pub async fn setup(name: &str) -> Db {
    let mut cfg = DatabaseConfig::from_url(format!("sqlite:file:{name}?mode=memory&cache=shared"));
    cfg.max_connections = 1;
    cfg.min_connections = Some(1);
    let db = Db::connect(&cfg).await.expect("Failed to connect to database");

    let manager = mig::SchemaManager::new(db.connection());
    mig::MigrationTrait::up(&CreateOwners, &manager)
        .await
        .expect("create owners");
    mig::MigrationTrait::up(&CreateItems, &manager)
        .await
        .expect("create items");
    db
}

pub fn item_data(name: &str, score: Option<i16>) -> FieldValues {
    FieldValues::new().set("name", name).set_opt("score", score)
}

/// Insert and commit one item per `(name, score)`.
pub async fn seed(session: &Session, rows: &[(&str, Option<i16>)]) -> Vec<item::Model> {
    let items = EntityQuery::<item::Entity>::new(session.clone());
    let mut out = Vec::with_capacity(rows.len());
    for (name, score) in rows {
        out.push(
            items
                .create_item(item_data(name, *score), false)
                .await
                .expect("seed item"),
        );
    }
    out
}

/// Repository over `items` with configurable rules.
///
/// Anonymous callers only see enabled items. Users only see items of active
/// owners, which needs a join on `owners`. Admins see everything.
pub struct ItemRepository {
    query: EntityQuery<item::Entity>,
    rules: PermissionRules,
}

impl ItemRepository {
    pub fn new(session: &Session, rules: PermissionRules) -> Self {
        Self {
            query: EntityQuery::new(session.clone()),
            rules,
        }
    }
}

#[async_trait::async_trait]
impl Repository for ItemRepository {
    type Entity = item::Entity;
    type Model = item::Model;
    type ActiveModel = item::ActiveModel;

    const NAME: &'static str = "items";

    fn query(&self) -> &EntityQuery<item::Entity> {
        &self.query
    }

    fn permission_rules(&self) -> PermissionRules {
        self.rules.clone()
    }

    fn anon_visibility(&self, _operation: Operation) -> Result<VisibilityFilter, RepositoryError> {
        Ok(VisibilityFilter::new(vec![
            Condition::all().add(item::Column::Disabled.eq(false)),
        ]))
    }

    fn user_visibility(&self, _operation: Operation) -> Result<VisibilityFilter, RepositoryError> {
        Ok(VisibilityFilter::with_join(vec![
            Condition::all().add(owner::Column::Active.eq(true)),
        ]))
    }

    fn admin_visibility(&self, _operation: Operation) -> Result<VisibilityFilter, RepositoryError> {
        Ok(VisibilityFilter::none())
    }
}

/// Repository bound to an entity without an `id` key.
pub struct TagRepository {
    query: EntityQuery<tag::Entity>,
}

impl TagRepository {
    pub fn new(session: &Session) -> Self {
        Self {
            query: EntityQuery::new(session.clone()),
        }
    }
}

#[async_trait::async_trait]
impl Repository for TagRepository {
    type Entity = tag::Entity;
    type Model = tag::Model;
    type ActiveModel = tag::ActiveModel;

    const NAME: &'static str = "tags";

    fn query(&self) -> &EntityQuery<tag::Entity> {
        &self.query
    }
}
