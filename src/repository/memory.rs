use super::{FeedbackStore, StoreError, UserStore};
use crate::domain::{Feedback, UserEmail, UserId, UserRecord};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-local user store. The email check and the insert happen under
/// one write lock, so duplicate emails are rejected atomically.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email.as_ref())
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.id == user_id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.users.read().await.clone())
    }

    async fn update(&self, user: &UserRecord) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(stored) => {
                stored.name = user.name.clone();
                stored.password_hash = user.password_hash.clone();
                stored.role = user.role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, user_id: UserId) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != user_id);
        Ok(users.len() != before)
    }
}

#[derive(Default)]
pub struct InMemoryFeedbackStore {
    entries: RwLock<Vec<Feedback>>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn insert(&self, feedback: &Feedback) -> Result<(), StoreError> {
        self.entries.write().await.push(feedback.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Feedback>, StoreError> {
        Ok(self.entries.read().await.clone())
    }
}
