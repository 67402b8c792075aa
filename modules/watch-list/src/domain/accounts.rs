//! Admin and user accounts: login, token refresh, registration and
//! disabling.

use std::sync::Arc;

use uuid::Uuid;
use watchlist_auth::{TokenCodec, TokenError, TokenKind, TokenPair, hash_password, verify_password};
use watchlist_db::{
    Access, Db, DisableFieldType, DisableRequest, FieldValues, ItemQuery, Repository, SelectMode,
};
use watchlist_security::CallerContext;

use super::error::DomainError;
use super::models::Account;
use crate::infra::storage::WatchListUnitOfWork;
use crate::infra::storage::entity::{admin, user};

impl From<admin::Model> for Account {
    fn from(m: admin::Model) -> Self {
        Self {
            id: m.id,
            login: m.username,
            disabled: m.disabled,
            created_at: m.created_at,
        }
    }
}

impl From<user::Model> for Account {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            login: m.email,
            disabled: m.disabled,
            created_at: m.created_at,
        }
    }
}

/// Stored credentials of one account.
struct Credentials {
    id: Uuid,
    hash: String,
    disabled: bool,
}

#[derive(Clone)]
pub struct AccountService {
    db: Db,
    tokens: Arc<TokenCodec>,
}

impl AccountService {
    #[must_use]
    pub fn new(db: Db, tokens: TokenCodec) -> Self {
        Self {
            db,
            tokens: Arc::new(tokens),
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    fn uow(&self) -> WatchListUnitOfWork {
        WatchListUnitOfWork::new(self.db.clone())
    }

    async fn hash(&self, password: &str) -> Result<String, DomainError> {
        let password = password.to_owned();
        let cost = self.tokens.config().bcrypt_cost;
        Ok(tokio::task::spawn_blocking(move || hash_password(&password, cost)).await??)
    }

    /// Check `password` against `found` off the async runtime.
    async fn authenticate(
        found: Option<Credentials>,
        password: &str,
    ) -> Result<Uuid, DomainError> {
        let Some(creds) = found else {
            return Err(DomainError::InvalidCredentials);
        };
        let password = password.to_owned();
        let hash = creds.hash;
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?;
        if !valid {
            return Err(DomainError::InvalidCredentials);
        }
        if creds.disabled {
            return Err(DomainError::AccountDisabled);
        }
        Ok(creds.id)
    }

    /// Exchange admin credentials for a token pair.
    ///
    /// # Errors
    /// - `DomainError::InvalidCredentials` for an unknown username or a wrong password.
    /// - `DomainError::AccountDisabled` for a disabled admin.
    pub async fn admin_login(&self, username: &str, password: &str) -> Result<TokenPair, DomainError> {
        let found = self
            .uow()
            .run(|scope| async move {
                let admin = scope
                    .repositories
                    .admins
                    .get_by_username(username, Access::trusted())
                    .await?;
                Ok::<_, DomainError>(admin.map(|a| Credentials {
                    id: a.id,
                    hash: a.password,
                    disabled: a.disabled,
                }))
            })
            .await?;
        let id = Self::authenticate(found, password).await.inspect_err(|e| {
            tracing::warn!(username, error = %e, "admin login refused");
        })?;
        tracing::info!(admin_id = %id, "admin logged in");
        Ok(self.tokens.issue_pair(id, true)?)
    }

    /// Reissue the pair of the admin named by `refresh_token`.
    ///
    /// # Errors
    /// - `DomainError::Token` for an invalid or expired token, or one not issued to an admin.
    /// - `DomainError::InvalidCredentials` when the admin no longer exists.
    /// - `DomainError::AccountDisabled` when the admin was disabled since.
    pub async fn refresh_admin(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        let claims = self.tokens.decode(refresh_token, TokenKind::Refresh)?;
        if !claims.is_admin {
            return Err(TokenError::Invalid("not an admin token".to_owned()).into());
        }
        let admin = self.admin_by_id(claims.user_id).await?;
        Ok(self.tokens.issue_pair(admin.id, true)?)
    }

    /// Exchange user credentials for a token pair.
    ///
    /// # Errors
    /// Same as [`AccountService::admin_login`].
    pub async fn user_login(&self, email: &str, password: &str) -> Result<TokenPair, DomainError> {
        let found = self
            .uow()
            .run(|scope| async move {
                let user = scope
                    .repositories
                    .users
                    .get_by_email(email, Access::trusted())
                    .await?;
                Ok::<_, DomainError>(user.map(|u| Credentials {
                    id: u.id,
                    hash: u.password,
                    disabled: u.disabled,
                }))
            })
            .await?;
        let id = Self::authenticate(found, password).await.inspect_err(|e| {
            tracing::warn!(email, error = %e, "user login refused");
        })?;
        tracing::info!(user_id = %id, "user logged in");
        Ok(self.tokens.issue_pair(id, false)?)
    }

    /// Create a user account on behalf of `caller`.
    ///
    /// # Errors
    /// - `DomainError::Validation` for a malformed or taken email.
    /// - `DomainError::Password` for an empty password.
    pub async fn register_user(
        &self,
        caller: &CallerContext,
        email: &str,
        password: &str,
    ) -> Result<Account, DomainError> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(DomainError::validation("email", "is not an email address"));
        }
        let hash = self.hash(password).await?;
        let access = Access::from(caller);
        let user = self
            .uow()
            .run(|scope| async move {
                let users = &scope.repositories.users;
                if users.get_by_email(email, Access::trusted()).await?.is_some() {
                    return Err(DomainError::validation("email", "is already registered"));
                }
                let data = FieldValues::new().set("email", email).set("password", hash);
                let user = users.create(data, true, access).await?;
                scope.session.commit().await?;
                Ok::<_, DomainError>(user)
            })
            .await?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user.into())
    }

    /// Create an admin account from a trusted context.
    ///
    /// # Errors
    /// - `DomainError::Validation` for an empty or taken username.
    /// - `DomainError::Password` for an empty password.
    pub async fn create_admin(&self, username: &str, password: &str) -> Result<Account, DomainError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(DomainError::validation("username", "must not be empty"));
        }
        let hash = self.hash(password).await?;
        let admin = self
            .uow()
            .run(|scope| async move {
                let admins = &scope.repositories.admins;
                if admins
                    .get_by_username(username, Access::trusted())
                    .await?
                    .is_some()
                {
                    return Err(DomainError::validation("username", "is already taken"));
                }
                let data = FieldValues::new()
                    .set("username", username)
                    .set("password", hash);
                let admin = admins.create(data, true, Access::trusted()).await?;
                scope.session.commit().await?;
                Ok::<_, DomainError>(admin)
            })
            .await?;
        tracing::info!(admin_id = %admin.id, "admin created");
        Ok(admin.into())
    }

    /// Disable the admins in `ids`. Returns how many were disabled.
    ///
    /// # Errors
    /// `DomainError::Repository` when `caller` is not an admin.
    pub async fn disable_admins(
        &self,
        caller: &CallerContext,
        ids: Vec<Uuid>,
    ) -> Result<u64, DomainError> {
        let access = Access::from(caller);
        let req = DisableRequest::new(ids, "disabled", DisableFieldType::Boolean).staged();
        let disabled = self
            .uow()
            .run(|scope| async move {
                let n = scope.repositories.admins.disable(req, access).await?;
                scope.session.commit().await?;
                Ok::<_, DomainError>(n)
            })
            .await?;
        tracing::info!(disabled, by = ?caller.subject_id(), "admins disabled");
        Ok(disabled)
    }

    /// Caller behind an access token.
    ///
    /// The account must still exist and be enabled.
    ///
    /// # Errors
    /// - `DomainError::Token` for an invalid or expired token.
    /// - `DomainError::InvalidCredentials` when the account no longer exists.
    /// - `DomainError::AccountDisabled` when the account is disabled.
    pub async fn resolve_caller(&self, access_token: &str) -> Result<CallerContext, DomainError> {
        let claims = self.tokens.decode(access_token, TokenKind::Access)?;
        if claims.is_admin {
            self.admin_by_id(claims.user_id).await?;
        } else {
            self.user_by_id(claims.user_id).await?;
        }
        Ok(claims.caller())
    }

    async fn admin_by_id(&self, id: Uuid) -> Result<admin::Model, DomainError> {
        let found = self
            .uow()
            .run(|scope| async move {
                let admin = scope
                    .repositories
                    .admins
                    .get(id.into(), ItemQuery::default(), SelectMode::Brief, Access::trusted())
                    .await?;
                Ok::<_, DomainError>(admin)
            })
            .await?;
        match found {
            None => Err(DomainError::InvalidCredentials),
            Some(a) if a.disabled => Err(DomainError::AccountDisabled),
            Some(a) => Ok(a),
        }
    }

    async fn user_by_id(&self, id: Uuid) -> Result<user::Model, DomainError> {
        let found = self
            .uow()
            .run(|scope| async move {
                let user = scope
                    .repositories
                    .users
                    .get(id.into(), ItemQuery::default(), SelectMode::Brief, Access::trusted())
                    .await?;
                Ok::<_, DomainError>(user)
            })
            .await?;
        match found {
            None => Err(DomainError::InvalidCredentials),
            Some(u) if u.disabled => Err(DomainError::AccountDisabled),
            Some(u) => Ok(u),
        }
    }
}
