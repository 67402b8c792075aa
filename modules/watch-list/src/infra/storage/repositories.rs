use std::sync::Arc;

use sea_orm::{ColumnTrait, Condition};
use watchlist_db::{
    Access, ConfigurationError, EntityQuery, ItemQuery, Repository, RepositoryError,
    RepositorySet, SelectMode, Session, UnitOfWork, VisibilityFilter, check_binding,
};
use watchlist_security::{Operation, PermissionMode, PermissionRules};

use super::entity::{admin, anime, kinopoisk, user};

/// Reads are public, writes need an admin.
fn catalog_rules() -> PermissionRules {
    PermissionRules::uniform(PermissionMode::Admin)
        .with(Operation::ReadList, PermissionMode::Anon)
        .with(Operation::ReadCount, PermissionMode::Anon)
        .with(Operation::ReadDetail, PermissionMode::Anon)
}

/// Repository over one watch-list table. Every visible row is public.
macro_rules! catalog_repository {
    ($(#[$doc:meta])* $name:ident, $entity:ident, $label:literal) => {
        $(#[$doc])*
        pub struct $name {
            query: EntityQuery<$entity::Entity>,
        }

        impl $name {
            #[must_use]
            pub fn new(session: &Session) -> Self {
                Self {
                    query: EntityQuery::new(session.clone()),
                }
            }
        }

        #[async_trait::async_trait]
        impl Repository for $name {
            type Entity = $entity::Entity;
            type Model = $entity::Model;
            type ActiveModel = $entity::ActiveModel;

            const NAME: &'static str = $label;

            fn query(&self) -> &EntityQuery<$entity::Entity> {
                &self.query
            }

            fn permission_rules(&self) -> PermissionRules {
                catalog_rules()
            }

            fn anon_visibility(&self, _: Operation) -> Result<VisibilityFilter, RepositoryError> {
                Ok(VisibilityFilter::none())
            }

            fn user_visibility(&self, _: Operation) -> Result<VisibilityFilter, RepositoryError> {
                Ok(VisibilityFilter::none())
            }

            fn admin_visibility(&self, _: Operation) -> Result<VisibilityFilter, RepositoryError> {
                Ok(VisibilityFilter::none())
            }
        }
    };
}

catalog_repository!(
    /// Anime entries.
    AnimeRepository,
    anime,
    "anime"
);
catalog_repository!(
    /// Kinopoisk entries.
    KinopoiskRepository,
    kinopoisk,
    "kinopoisk"
);

/// Admin accounts. Only admins see or touch them.
pub struct AdminRepository {
    query: EntityQuery<admin::Entity>,
}

impl AdminRepository {
    #[must_use]
    pub fn new(session: &Session) -> Self {
        Self {
            query: EntityQuery::new(session.clone()),
        }
    }

    /// Admin with the given `username`.
    ///
    /// # Errors
    /// Same as [`Repository::get`].
    pub async fn get_by_username(
        &self,
        username: &str,
        access: Access,
    ) -> Result<Option<admin::Model>, RepositoryError> {
        self.get(
            username.into(),
            ItemQuery::by_field("username"),
            SelectMode::Brief,
            access,
        )
        .await
    }
}

#[async_trait::async_trait]
impl Repository for AdminRepository {
    type Entity = admin::Entity;
    type Model = admin::Model;
    type ActiveModel = admin::ActiveModel;

    const NAME: &'static str = "admins";

    fn query(&self) -> &EntityQuery<admin::Entity> {
        &self.query
    }

    fn permission_rules(&self) -> PermissionRules {
        PermissionRules::uniform(PermissionMode::Admin)
    }

    fn anon_visibility(&self, _: Operation) -> Result<VisibilityFilter, RepositoryError> {
        Ok(VisibilityFilter::deny_all())
    }

    fn user_visibility(&self, _: Operation) -> Result<VisibilityFilter, RepositoryError> {
        Ok(VisibilityFilter::deny_all())
    }

    fn admin_visibility(&self, _: Operation) -> Result<VisibilityFilter, RepositoryError> {
        Ok(VisibilityFilter::none())
    }
}

/// Regular accounts.
///
/// Anyone may register. Users see active accounts only.
pub struct UsersRepository {
    query: EntityQuery<user::Entity>,
}

impl UsersRepository {
    #[must_use]
    pub fn new(session: &Session) -> Self {
        Self {
            query: EntityQuery::new(session.clone()),
        }
    }

    /// User with the given `email`.
    ///
    /// # Errors
    /// Same as [`Repository::get`].
    pub async fn get_by_email(
        &self,
        email: &str,
        access: Access,
    ) -> Result<Option<user::Model>, RepositoryError> {
        self.get(
            email.into(),
            ItemQuery::by_field("email"),
            SelectMode::Brief,
            access,
        )
        .await
    }
}

#[async_trait::async_trait]
impl Repository for UsersRepository {
    type Entity = user::Entity;
    type Model = user::Model;
    type ActiveModel = user::ActiveModel;

    const NAME: &'static str = "users";

    fn query(&self) -> &EntityQuery<user::Entity> {
        &self.query
    }

    fn permission_rules(&self) -> PermissionRules {
        PermissionRules::uniform(PermissionMode::Admin)
            .with(Operation::Create, PermissionMode::Anyone)
            .with(Operation::ReadList, PermissionMode::User)
            .with(Operation::ReadCount, PermissionMode::User)
            .with(Operation::ReadDetail, PermissionMode::User)
    }

    fn anon_visibility(&self, _: Operation) -> Result<VisibilityFilter, RepositoryError> {
        Ok(VisibilityFilter::deny_all())
    }

    fn user_visibility(&self, _: Operation) -> Result<VisibilityFilter, RepositoryError> {
        Ok(VisibilityFilter::new(vec![
            Condition::all().add(user::Column::Disabled.eq(false)),
        ]))
    }

    fn admin_visibility(&self, _: Operation) -> Result<VisibilityFilter, RepositoryError> {
        Ok(VisibilityFilter::none())
    }
}

/// Every repository of the service, sharing one session.
#[derive(Clone)]
pub struct WatchListRepositories {
    pub anime: Arc<AnimeRepository>,
    pub kinopoisk: Arc<KinopoiskRepository>,
    pub admins: Arc<AdminRepository>,
    pub users: Arc<UsersRepository>,
}

impl RepositorySet for WatchListRepositories {
    fn init_repositories(session: &Session) -> Result<Self, ConfigurationError> {
        check_binding::<AnimeRepository>()?;
        check_binding::<KinopoiskRepository>()?;
        check_binding::<AdminRepository>()?;
        check_binding::<UsersRepository>()?;
        Ok(Self {
            anime: Arc::new(AnimeRepository::new(session)),
            kinopoisk: Arc::new(KinopoiskRepository::new(session)),
            admins: Arc::new(AdminRepository::new(session)),
            users: Arc::new(UsersRepository::new(session)),
        })
    }
}

pub type WatchListUnitOfWork = UnitOfWork<WatchListRepositories>;
