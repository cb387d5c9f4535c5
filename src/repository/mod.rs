//! Durable state lives behind these traits. Request handling never sees
//! the storage engine, only `StoreError`.

mod memory;
mod postgres;

pub use memory::{InMemoryFeedbackStore, InMemoryUserStore};
pub use postgres::{PgFeedbackStore, PgUserStore};

use crate::domain::{Feedback, UserEmail, UserId, UserRecord};
use crate::error_handling::error_chain_fmt;
use async_trait::async_trait;

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("A user with this email already exists.")]
    Conflict,
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `StoreError::Conflict` when the email is already taken.
    async fn insert(&self, user: &UserRecord) -> Result<(), StoreError>;

    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// All users, oldest first.
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Overwrites name, credential and role. Returns `false` if no such user.
    async fn update(&self, user: &UserRecord) -> Result<bool, StoreError>;

    /// Returns `false` if no such user.
    async fn delete(&self, user_id: UserId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn insert(&self, feedback: &Feedback) -> Result<(), StoreError>;

    /// All feedback in insertion order.
    async fn list(&self) -> Result<Vec<Feedback>, StoreError>;
}
