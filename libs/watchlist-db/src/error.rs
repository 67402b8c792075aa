use thiserror::Error;
use watchlist_security::PermissionDenied;

/// Store-level failures.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error("session is closed")]
    SessionClosed,

    #[error("invalid database configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised by the query layer.
///
/// Field and filter errors are produced before any statement reaches the store.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("model '{model}' has no field '{field}'")]
    UnknownField { model: String, field: String },

    #[error("field '{field}' of model '{model}' cannot hold the given value")]
    FieldType { model: String, field: String },

    #[error("field '{field}' of model '{model}' is neither boolean nor timestamp")]
    DisableFieldType { model: String, field: String },

    #[error("invalid filter on '{field}': {reason}")]
    InvalidFilter { field: String, reason: String },

    #[error(transparent)]
    Db(#[from] DbError),
}

impl QueryError {
    #[must_use]
    pub fn unknown_field(model: &str, field: &str) -> Self {
        Self::UnknownField {
            model: model.to_owned(),
            field: field.to_owned(),
        }
    }

    #[must_use]
    pub fn invalid_filter(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's input rather than the store.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, Self::Db(_))
    }
}

impl From<sea_orm::DbErr> for QueryError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Db(DbError::Sea(e))
    }
}

/// A repository type whose binding to its model is unusable.
#[derive(Debug, Error)]
#[error("repository '{repository}' is misconfigured: {reason}")]
pub struct ConfigurationError {
    pub repository: &'static str,
    pub reason: String,
}

impl ConfigurationError {
    #[must_use]
    pub fn new(repository: &'static str, reason: impl Into<String>) -> Self {
        Self {
            repository,
            reason: reason.into(),
        }
    }
}

/// Errors raised by repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Permission(#[from] PermissionDenied),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("repository '{repository}' does not provide {capability}")]
    NotImplemented {
        repository: &'static str,
        capability: &'static str,
    },
}

impl RepositoryError {
    #[must_use]
    pub fn not_implemented(repository: &'static str, capability: &'static str) -> Self {
        Self::NotImplemented {
            repository,
            capability,
        }
    }
}

impl From<DbError> for RepositoryError {
    fn from(e: DbError) -> Self {
        Self::Query(QueryError::Db(e))
    }
}

impl From<sea_orm::DbErr> for RepositoryError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Query(QueryError::from(e))
    }
}
