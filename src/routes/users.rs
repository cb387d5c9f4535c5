use crate::{
    accounts::{self, AccountError, ProfileChanges},
    domain::UserId,
    startup::AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Json, Path, State,
    },
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

fn user_id(path: Result<Path<Uuid>, PathRejection>) -> Result<UserId, AccountError> {
    let Path(id) = path.map_err(|e| AccountError::Validation(e.body_text()))?;
    Ok(id.into())
}

#[tracing::instrument(name = "List all users", skip(state))]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AccountError> {
    let users = accounts::list_users(state.users.as_ref()).await?;
    Ok(Json(users))
}

#[tracing::instrument(name = "Get a user by id", skip(state, path))]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AccountError> {
    let user = accounts::get_user(state.users.as_ref(), user_id(path)?).await?;
    Ok(Json(user))
}

#[tracing::instrument(name = "Update a user by id", skip(state, path, payload))]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ProfileChanges>, JsonRejection>,
) -> Result<impl IntoResponse, AccountError> {
    let user_id = user_id(path)?;
    let Json(changes) = payload.map_err(|e| AccountError::Validation(e.body_text()))?;
    let user = accounts::update_user(state.users.as_ref(), user_id, changes).await?;
    Ok(Json(user))
}

#[tracing::instrument(name = "Delete a user by id", skip(state, path))]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AccountError> {
    accounts::delete_user(state.users.as_ref(), user_id(path)?).await?;
    Ok(Json(serde_json::json!({ "message": "User deleted successfully." })))
}
