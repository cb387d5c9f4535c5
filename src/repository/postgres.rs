use super::{FeedbackStore, StoreError, UserStore};
use crate::domain::{Feedback, Role, UserEmail, UserId, UserRecord};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use sqlx::PgPool;
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_error) => db_error.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::try_from(row.role).map_err(anyhow::Error::msg)?;
        Ok(Self {
            id: row.user_id.into(),
            name: row.name,
            email: row.email,
            password_hash: Secret::new(row.password_hash),
            role,
            created_at: row.created_at,
        })
    }
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[tracing::instrument(name = "Saving new user details in the database", skip_all)]
    async fn insert(&self, user: &UserRecord) -> Result<(), StoreError> {
        // The unique index on `email` is what makes concurrent signups safe.
        sqlx::query(
            r#"
            INSERT INTO users (user_id, name, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.password_hash.expose_secret())
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict
            } else {
                StoreError::Unexpected(
                    anyhow::Error::new(e).context("Failed to insert a new user."),
                )
            }
        })?;
        Ok(())
    }

    #[tracing::instrument(name = "Get user by email", skip_all)]
    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, name, email, password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_ref())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to perform a query to retrieve a user by email.")?;
        Ok(row.map(UserRecord::try_from).transpose()?)
    }

    #[tracing::instrument(name = "Get user by id", skip(self))]
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, name, email, password_hash, role, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(*user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to perform a query to retrieve a user by id.")?;
        Ok(row.map(UserRecord::try_from).transpose()?)
    }

    #[tracing::instrument(name = "List users", skip(self))]
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, name, email, password_hash, role, created_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to perform a query to list users.")?;
        let users = rows
            .into_iter()
            .map(UserRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    #[tracing::instrument(name = "Update user", skip_all, fields(user_id = %user.id))]
    async fn update(&self, user: &UserRecord) -> Result<bool, StoreError> {
        let affected = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, password_hash = $3, role = $4
            WHERE user_id = $1
            "#,
        )
        .bind(*user.id)
        .bind(&user.name)
        .bind(user.password_hash.expose_secret())
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to update the user in the database.")?
        .rows_affected();
        Ok(affected > 0)
    }

    #[tracing::instrument(name = "Delete user", skip(self))]
    async fn delete(&self, user_id: UserId) -> Result<bool, StoreError> {
        let affected = sqlx::query(r#"DELETE FROM users WHERE user_id = $1"#)
            .bind(*user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete the user from the database.")?
            .rows_affected();
        Ok(affected > 0)
    }
}

#[derive(sqlx::FromRow)]
struct FeedbackRow {
    feedback_id: Uuid,
    name: String,
    email: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl From<FeedbackRow> for Feedback {
    fn from(row: FeedbackRow) -> Self {
        Self {
            id: row.feedback_id,
            name: row.name,
            email: row.email,
            message: row.message,
            created_at: row.created_at,
        }
    }
}

pub struct PgFeedbackStore {
    pool: PgPool,
}

impl PgFeedbackStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedbackStore for PgFeedbackStore {
    #[tracing::instrument(name = "Saving feedback in the database", skip_all)]
    async fn insert(&self, feedback: &Feedback) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO feedback (feedback_id, name, email, message, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(feedback.id)
        .bind(&feedback.name)
        .bind(&feedback.email)
        .bind(&feedback.message)
        .bind(feedback.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert feedback.")?;
        Ok(())
    }

    #[tracing::instrument(name = "List feedback", skip(self))]
    async fn list(&self) -> Result<Vec<Feedback>, StoreError> {
        let rows = sqlx::query_as::<_, FeedbackRow>(
            r#"
            SELECT feedback_id, name, email, message, created_at
            FROM feedback
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to perform a query to list feedback.")?;
        Ok(rows.into_iter().map(Feedback::from).collect())
    }
}
