use crate::{
    accounts::{self, AccountError, ProfileChanges},
    authentication::AuthenticatedUser,
    startup::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    response::IntoResponse,
    Extension,
};
use std::sync::Arc;

#[tracing::instrument(name = "Update profile by email", skip(state, actor, payload))]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(email): Path<String>,
    payload: Result<Json<ProfileChanges>, JsonRejection>,
) -> Result<impl IntoResponse, AccountError> {
    let Json(changes) = payload.map_err(|e| AccountError::Validation(e.body_text()))?;
    let user = accounts::update_profile(state.users.as_ref(), &actor, &email, changes).await?;
    Ok(Json(serde_json::json!({
        "message": "Profile updated successfully.",
        "user": user,
    })))
}
