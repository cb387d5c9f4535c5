//! Account lifecycle: signup, login, profile edits and the administrative
//! record operations.

use crate::{
    authentication::{
        hash_password, validate_credentials, AuthError, AuthenticatedUser, Credentials,
        TokenIssuer,
    },
    domain::{NewUser, Password, Role, User, UserEmail, UserId, UserName, UserRecord},
    error_handling::{error_chain_fmt, json_error},
    repository::{StoreError, UserStore},
};
use anyhow::Context;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use secrecy::{ExposeSecret, Secret};

#[derive(thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("User already exists.")]
    Conflict,
    #[error("Invalid credentials.")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error("User not found.")]
    NotFound,
    #[error("You are not allowed to perform this action.")]
    Forbidden,
    #[error("Server error.")]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for AccountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => AccountError::Conflict,
            StoreError::Unexpected(e) => AccountError::UnexpectedError(e),
        }
    }
}

impl From<AuthError> for AccountError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials(e) => AccountError::InvalidCredentials(e),
            AuthError::UnexpectedError(e) => AccountError::UnexpectedError(e),
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        // A duplicate email is reported as 400, not 409.
        let status = match self {
            AccountError::Validation(_)
            | AccountError::Conflict
            | AccountError::InvalidCredentials(_) => {
                tracing::warn!("{self:?}");
                StatusCode::BAD_REQUEST
            }
            AccountError::NotFound => {
                tracing::warn!("{self:?}");
                StatusCode::NOT_FOUND
            }
            AccountError::Forbidden => {
                tracing::warn!("{self:?}");
                StatusCode::FORBIDDEN
            }
            AccountError::UnexpectedError(_) => {
                tracing::error!("{self:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        json_error(status, self.to_string())
    }
}

/// Raw signup input, before validation.
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: Secret<String>,
}

impl TryFrom<Registration> for NewUser {
    type Error = String;

    fn try_from(value: Registration) -> Result<Self, Self::Error> {
        let name = UserName::parse(value.name)?;
        let email = UserEmail::parse(value.email)?;
        let password = Password::parse(value.password).map_err(|e| e.to_string())?;
        Ok(Self {
            name,
            email,
            password,
        })
    }
}

/// The only fields a caller may change on an existing account. Empty
/// strings count as "not provided".
#[derive(serde::Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProfileChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<Secret<String>>,
}

#[tracing::instrument(
    name = "Register a new user",
    skip(users, tokens, registration),
    fields(user_email = %registration.email)
)]
pub async fn register(
    users: &dyn UserStore,
    tokens: &TokenIssuer,
    registration: Registration,
) -> Result<(User, String), AccountError> {
    let new_user: NewUser = registration
        .try_into()
        .map_err(AccountError::Validation)?;
    // Fast path only: the store rejects a duplicate that slips in between.
    if users.find_by_email(&new_user.email).await?.is_some() {
        return Err(AccountError::Conflict);
    }
    let record = create_user(users, new_user, Role::User).await?;
    let token = tokens
        .issue(record.id, record.role)
        .context("Failed to issue a session token.")?;
    Ok((record.into(), token))
}

async fn create_user(
    users: &dyn UserStore,
    new_user: NewUser,
    role: Role,
) -> Result<UserRecord, AccountError> {
    let password_hash = hash_password(new_user.password).await?;
    let record = UserRecord {
        id: UserId::generate(),
        name: new_user.name.as_ref().to_owned(),
        email: new_user.email.as_ref().to_owned(),
        password_hash,
        role,
        created_at: Utc::now(),
    };
    users.insert(&record).await?;
    Ok(record)
}

/// Verifies credentials and issues a fresh token. Earlier tokens stay valid.
#[tracing::instrument(
    name = "Authenticate user",
    skip(users, tokens, credentials),
    fields(user_email = %credentials.email, user_id = tracing::field::Empty)
)]
pub async fn authenticate(
    users: &dyn UserStore,
    tokens: &TokenIssuer,
    credentials: Credentials,
) -> Result<(User, String), AccountError> {
    let record = validate_credentials(credentials, users).await?;
    tracing::Span::current().record("user_id", &tracing::field::display(&record.id));
    let token = tokens
        .issue(record.id, record.role)
        .context("Failed to issue a session token.")?;
    Ok((record.into(), token))
}

/// Partial update addressed by email, on behalf of `actor`.
#[tracing::instrument(name = "Update profile", skip(users, changes))]
pub async fn update_profile(
    users: &dyn UserStore,
    actor: &AuthenticatedUser,
    email: &str,
    changes: ProfileChanges,
) -> Result<User, AccountError> {
    let email = UserEmail::parse(email.to_owned()).map_err(|_| AccountError::NotFound)?;
    let record = users
        .find_by_email(&email)
        .await?
        .ok_or(AccountError::NotFound)?;
    if !actor.may_manage(record.id) {
        return Err(AccountError::Forbidden);
    }
    apply_changes(users, record, changes).await
}

#[tracing::instrument(name = "List users", skip(users))]
pub async fn list_users(users: &dyn UserStore) -> Result<Vec<User>, AccountError> {
    let records = users.list().await?;
    Ok(records.into_iter().map(User::from).collect())
}

#[tracing::instrument(name = "Get user", skip(users))]
pub async fn get_user(users: &dyn UserStore, user_id: UserId) -> Result<User, AccountError> {
    users
        .find_by_id(user_id)
        .await?
        .map(User::from)
        .ok_or(AccountError::NotFound)
}

#[tracing::instrument(name = "Delete user", skip(users))]
pub async fn delete_user(users: &dyn UserStore, user_id: UserId) -> Result<(), AccountError> {
    if users.delete(user_id).await? {
        Ok(())
    } else {
        Err(AccountError::NotFound)
    }
}

/// Administrative update by id. Only name and password can change.
#[tracing::instrument(name = "Update user", skip(users, changes))]
pub async fn update_user(
    users: &dyn UserStore,
    user_id: UserId,
    changes: ProfileChanges,
) -> Result<User, AccountError> {
    let record = users
        .find_by_id(user_id)
        .await?
        .ok_or(AccountError::NotFound)?;
    apply_changes(users, record, changes).await
}

async fn apply_changes(
    users: &dyn UserStore,
    mut record: UserRecord,
    changes: ProfileChanges,
) -> Result<User, AccountError> {
    if let Some(name) = changes.name.filter(|n| !n.is_empty()) {
        let name = UserName::parse(name).map_err(AccountError::Validation)?;
        record.name = name.as_ref().to_owned();
    }
    if let Some(password) = changes.password.filter(|p| !p.expose_secret().is_empty()) {
        let password =
            Password::parse(password).map_err(|e| AccountError::Validation(e.to_string()))?;
        record.password_hash = hash_password(password).await?;
    }
    if !users.update(&record).await? {
        // Deleted between the read and the write.
        return Err(AccountError::NotFound);
    }
    Ok(record.into())
}

/// Creates the configured admin account unless its email is already taken.
/// Returns whether an account was created.
#[tracing::instrument(name = "Ensure admin account", skip(users, name, password))]
pub async fn ensure_admin(
    users: &dyn UserStore,
    name: String,
    email: String,
    password: Secret<String>,
) -> Result<bool, AccountError> {
    let new_user: NewUser = Registration {
        name,
        email,
        password,
    }
    .try_into()
    .map_err(AccountError::Validation)?;
    if users.find_by_email(&new_user.email).await?.is_some() {
        return Ok(false);
    }
    match create_user(users, new_user, Role::Admin).await {
        Ok(_) => Ok(true),
        Err(AccountError::Conflict) => Ok(false),
        Err(e) => Err(e),
    }
}
