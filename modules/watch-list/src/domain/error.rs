use watchlist_auth::{PasswordError, TokenError};
use watchlist_db::{ConfigurationError, DbError, QueryError, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation error on field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Invalid filter on '{field}': {reason}")]
    Filter { field: String, reason: String },

    #[error("Field '{field}' does not exist on '{model}'")]
    FilterField { field: String, model: String },

    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("{entity} '{id}' could not be deleted")]
    DeleteFailed { entity: &'static str, id: String },

    #[error(transparent)]
    Repository(RepositoryError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<RepositoryError> for DomainError {
    /// Caller mistakes in filters and field names surface as their own
    /// variants; everything else stays a repository error.
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Query(QueryError::InvalidFilter { field, reason }) => {
                Self::Filter { field, reason }
            }
            RepositoryError::Query(QueryError::UnknownField { model, field }) => {
                Self::FilterField { field, model }
            }
            RepositoryError::Query(QueryError::FieldType { model, field }) => Self::Validation {
                message: format!("value does not fit the column of '{model}'"),
                field,
            },
            other => Self::Repository(other),
        }
    }
}

impl From<QueryError> for DomainError {
    fn from(e: QueryError) -> Self {
        RepositoryError::Query(e).into()
    }
}

impl From<DbError> for DomainError {
    fn from(e: DbError) -> Self {
        RepositoryError::from(e).into()
    }
}

impl From<tokio::task::JoinError> for DomainError {
    fn from(e: tokio::task::JoinError) -> Self {
        tracing::error!(error = %e, "password hashing task failed");
        Self::Internal(e.to_string())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use watchlist_security::{Operation, PermissionDenied};

    #[test]
    fn caller_query_errors_get_their_own_variants() {
        let err: DomainError = QueryError::invalid_filter("score", "bad").into();
        assert!(matches!(err, DomainError::Filter { ref field, .. } if field == "score"));

        let err: DomainError = QueryError::unknown_field("anime", "rating").into();
        assert!(matches!(err, DomainError::FilterField { ref field, .. } if field == "rating"));
    }

    #[test]
    fn permission_errors_stay_repository_errors() {
        let denied = PermissionDenied::AnonNotAllowed {
            operation: Operation::Create,
        };
        let err: DomainError = RepositoryError::from(denied).into();
        assert!(matches!(
            err,
            DomainError::Repository(RepositoryError::Permission(_))
        ));
    }

    #[test]
    fn store_errors_stay_repository_errors() {
        let err: DomainError = DbError::SessionClosed.into();
        assert!(matches!(
            err,
            DomainError::Repository(RepositoryError::Query(QueryError::Db(_)))
        ));
    }
}
