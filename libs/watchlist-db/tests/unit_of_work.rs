#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::{ItemRepository, TagRepository, item_data, setup};
use tracing_test::traced_test;
use watchlist_db::{
    Access, ConfigurationError, CountQuery, DbError, Repository, RepositoryError, RepositorySet,
    Session, UnitOfWork, check_binding,
};
use watchlist_security::{PermissionMode, PermissionRules};

#[derive(Debug, thiserror::Error)]
enum WorkError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Repo(#[from] RepositoryError),
    #[error("body failed: {0}")]
    Body(&'static str),
}

#[derive(Clone)]
struct Repos {
    items: Arc<ItemRepository>,
}

impl RepositorySet for Repos {
    fn init_repositories(session: &Session) -> Result<Self, ConfigurationError> {
        check_binding::<ItemRepository>()?;
        Ok(Self {
            items: Arc::new(ItemRepository::new(session, PermissionRules::default())),
        })
    }
}

#[derive(Clone)]
struct BrokenRepos;

impl RepositorySet for BrokenRepos {
    fn init_repositories(_session: &Session) -> Result<Self, ConfigurationError> {
        check_binding::<TagRepository>()?;
        Ok(Self)
    }
}

async fn stored_items(db: &watchlist_db::Db) -> u64 {
    let session = db.session();
    ItemRepository::new(&session, PermissionRules::default())
        .count(CountQuery::default(), Access::new(PermissionMode::Admin))
        .await
        .unwrap()
}

#[tokio::test]
async fn committed_work_persists() {
    let db = setup("uow_commit").await;

    let created = UnitOfWork::<Repos>::new(db.clone())
        .run(|scope| async move {
            let admin = Access::new(PermissionMode::Admin);
            let a = scope.repositories.items.create(item_data("Akira", None), true, admin).await?;
            scope.repositories.items.create(item_data("Paprika", None), true, admin).await?;
            scope.session.commit().await?;
            Ok::<_, WorkError>(a)
        })
        .await
        .unwrap();

    assert_eq!(created.name, "Akira");
    assert_eq!(stored_items(&db).await, 2);
}

#[tokio::test]
async fn uncommitted_work_is_discarded_on_success() {
    let db = setup("uow_uncommitted").await;

    UnitOfWork::<Repos>::new(db.clone())
        .run(|scope| async move {
            scope
                .repositories
                .items
                .create(item_data("Perfect Blue", None), true, Access::new(PermissionMode::Admin))
                .await?;
            Ok::<_, WorkError>(())
        })
        .await
        .unwrap();

    assert_eq!(stored_items(&db).await, 0);
}

#[tokio::test]
#[traced_test]
async fn failed_body_rolls_back_once_and_closes() {
    let db = setup("uow_failure").await;
    let mut uow = UnitOfWork::<Repos>::new(db.clone());
    let scope = uow.enter().unwrap().clone();

    scope
        .repositories
        .items
        .create(item_data("Millennium Actress", None), true, Access::new(PermissionMode::Admin))
        .await
        .unwrap();
    assert!(scope.session.in_transaction().await);

    let failure = WorkError::Body("boom");
    uow.exit(Some(&failure)).await.unwrap();

    assert!(!uow.is_active());
    assert!(scope.session.is_closed().await);
    assert!(matches!(
        scope.session.flush().await,
        Err(DbError::SessionClosed)
    ));
    assert_eq!(stored_items(&db).await, 0);

    assert!(logs_contain("unit of work failed"));
    logs_assert(|lines: &[&str]| {
        match lines
            .iter()
            .filter(|line| line.contains("unit of work rolled back"))
            .count()
        {
            1 => Ok(()),
            n => Err(format!("expected one rollback, saw {n}")),
        }
    });
}

#[tokio::test]
async fn run_returns_the_body_error() {
    let db = setup("uow_body_error").await;

    let err = UnitOfWork::<Repos>::new(db.clone())
        .run(|scope| async move {
            scope
                .repositories
                .items
                .create(item_data("Tokyo Godfathers", None), true, Access::new(PermissionMode::Admin))
                .await?;
            Err::<(), _>(WorkError::Body("late failure"))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, WorkError::Body("late failure")));
    assert_eq!(stored_items(&db).await, 0);
}

#[tokio::test]
async fn commit_and_rollback_outside_a_scope_do_nothing() {
    let db = setup("uow_inactive").await;
    let uow = UnitOfWork::<Repos>::new(db);

    assert!(!uow.is_active());
    assert!(uow.repositories().is_none());
    uow.commit().await.unwrap();
    uow.rollback().await.unwrap();
}

#[tokio::test]
async fn invalid_binding_fails_on_entry() {
    let db = setup("uow_bad_binding").await;

    let err = UnitOfWork::<BrokenRepos>::new(db)
        .run(|_scope| async move { Ok::<_, WorkError>(()) })
        .await
        .unwrap_err();

    match err {
        WorkError::Config(e) => assert_eq!(e.repository, "tags"),
        other => panic!("expected a configuration error, got {other}"),
    }
}

#[tokio::test]
#[traced_test]
async fn cancelled_work_is_rolled_back() {
    let db = setup("uow_cancelled").await;

    let work = UnitOfWork::<Repos>::new(db.clone()).run(|scope| async move {
        scope
            .repositories
            .items
            .create(
                item_data("Redline", None),
                true,
                Access::new(PermissionMode::Admin),
            )
            .await?;
        std::future::pending::<()>().await;
        Ok::<_, WorkError>(())
    });
    let outcome = tokio::time::timeout(std::time::Duration::from_millis(200), work).await;

    assert!(outcome.is_err());
    assert_eq!(stored_items(&db).await, 0);
    assert!(logs_contain("unit of work dropped while active"));
}
