//! Unit of work: one session shared by a set of repositories.
//!
//! ```ignore
//! let out = UnitOfWork::<WatchListRepositories>::new(db.clone())
//!     .run(|scope| async move {
//!         let item = scope.repositories.anime.create(data, true, access).await?;
//!         scope.session.commit().await?;
//!         Ok::<_, ServiceError>(item)
//!     })
//!     .await?;
//! ```
//!
//! Leaving the scope always rolls back whatever was not committed and closes
//! the session, whether the body succeeded or failed. A unit of work dropped
//! mid-body, for example by a timeout, rolls back on the current runtime.

use std::fmt::Display;
use std::future::Future;

use crate::error::{ConfigurationError, DbError};
use crate::session::{Db, Session};

/// The repositories a concrete unit of work binds to its session.
pub trait RepositorySet: Clone + Send + Sync + Sized {
    /// Build every repository on `session`.
    ///
    /// # Errors
    /// Returns `ConfigurationError` if a repository binding is invalid.
    fn init_repositories(session: &Session) -> Result<Self, ConfigurationError>;
}

/// What the body of a unit of work sees.
#[derive(Clone, Debug)]
pub struct Scope<R> {
    pub session: Session,
    pub repositories: R,
}

pub struct UnitOfWork<R: RepositorySet> {
    db: Db,
    scope: Option<Scope<R>>,
}

impl<R: RepositorySet> UnitOfWork<R> {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db, scope: None }
    }

    /// Open the session and build the repositories.
    ///
    /// Entering an already active unit of work returns the current scope.
    ///
    /// # Errors
    /// Returns `ConfigurationError` if a repository binding is invalid.
    pub fn enter(&mut self) -> Result<&Scope<R>, ConfigurationError> {
        if self.scope.is_none() {
            let session = self.db.session();
            let repositories = R::init_repositories(&session)?;
            tracing::debug!(session = session.id(), "unit of work entered");
            self.scope = Some(Scope {
                session,
                repositories,
            });
        }
        self.scope
            .as_ref()
            .ok_or_else(|| ConfigurationError::new("unit_of_work", "scope was not opened"))
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.scope.is_some()
    }

    #[must_use]
    pub fn repositories(&self) -> Option<&R> {
        self.scope.as_ref().map(|s| &s.repositories)
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.scope.as_ref().map(|s| &s.session)
    }

    /// Commit the session. A no-op outside an active scope.
    ///
    /// # Errors
    /// Returns `DbError` if the store rejects the commit.
    pub async fn commit(&self) -> Result<(), DbError> {
        match &self.scope {
            Some(scope) => scope.session.commit().await,
            None => Ok(()),
        }
    }

    /// Roll the session back. A no-op outside an active scope.
    ///
    /// # Errors
    /// Returns `DbError` if the store rejects the rollback.
    pub async fn rollback(&self) -> Result<(), DbError> {
        match &self.scope {
            Some(scope) => scope.session.rollback().await,
            None => Ok(()),
        }
    }

    /// Leave the scope: roll back, then close the session.
    ///
    /// `failure` is the error that ended the body, if any; it is logged.
    ///
    /// # Errors
    /// Returns the first `DbError` raised by the rollback or the close. The
    /// session is closed either way.
    pub async fn exit(&mut self, failure: Option<&(dyn Display + Sync)>) -> Result<(), DbError> {
        let Some(scope) = self.scope.take() else {
            return Ok(());
        };
        if let Some(err) = failure {
            tracing::error!(session = scope.session.id(), error = %err, "unit of work failed");
        }
        let rolled_back = scope.session.rollback().await;
        tracing::debug!(session = scope.session.id(), "unit of work rolled back");
        let closed = scope.session.close().await;
        tracing::debug!(session = scope.session.id(), "unit of work closed");
        rolled_back.and(closed)
    }

    /// Run `body` inside the scope, then leave it.
    ///
    /// # Errors
    /// Returns the body's error, or else the error raised while entering or
    /// leaving the scope.
    pub async fn run<T, E, F, Fut>(mut self, body: F) -> Result<T, E>
    where
        F: FnOnce(Scope<R>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<ConfigurationError> + From<DbError> + Display + Sync,
    {
        let scope = self.enter()?.clone();
        let result = body(scope).await;
        let exited = match &result {
            Ok(_) => self.exit(None).await,
            Err(e) => self.exit(Some(e)).await,
        };
        let value = result?;
        exited?;
        Ok(value)
    }
}

impl<R: RepositorySet> Drop for UnitOfWork<R> {
    fn drop(&mut self) {
        let Some(scope) = self.scope.take() else {
            return;
        };
        let session = scope.session;
        tracing::warn!(
            session = session.id(),
            "unit of work dropped while active; pending writes are rolled back"
        );
        // Without a runtime the store discards the transaction when the
        // session's last handle goes away.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            drop(handle.spawn(async move {
                if let Err(e) = session.close().await {
                    tracing::error!(
                        session = session.id(),
                        error = %e,
                        "rollback of dropped unit of work failed"
                    );
                }
            }));
        }
    }
}
