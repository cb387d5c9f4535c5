use crate::{
    notifications::{self, NotificationError},
    startup::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

#[derive(serde::Deserialize)]
pub struct FeedbackData {
    name: String,
    #[serde(default)]
    email: String,
    message: String,
}

#[tracing::instrument(name = "Submit feedback", skip(state, payload))]
pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FeedbackData>, JsonRejection>,
) -> Result<impl IntoResponse, NotificationError> {
    let Json(body) = payload.map_err(|e| NotificationError::InvalidArgument(e.body_text()))?;
    notifications::submit_feedback(
        state.feedback.as_ref(),
        &state.notifier,
        body.name,
        body.email,
        body.message,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Feedback submitted successfully." })),
    ))
}

#[tracing::instrument(name = "List all feedback", skip(state))]
pub async fn list_feedback(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, NotificationError> {
    let feedback = notifications::list_feedback(state.feedback.as_ref()).await?;
    Ok(Json(feedback))
}
