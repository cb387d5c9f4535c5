use crate::{
    accounts::{self, AccountError, Registration},
    startup::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use secrecy::Secret;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SignupData {
    name: String,
    email: String,
    password: Secret<String>,
}

// A body that fails to deserialize is a 400 like any other bad input,
// hence the `Result` around the extractor.
#[tracing::instrument(name = "Sign up", skip(state, payload))]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupData>, JsonRejection>,
) -> Result<impl IntoResponse, AccountError> {
    let Json(body) = payload.map_err(|e| AccountError::Validation(e.body_text()))?;
    let registration = Registration {
        name: body.name,
        email: body.email,
        password: body.password,
    };
    let (_, token) = accounts::register(state.users.as_ref(), &state.tokens, registration).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User created successfully.",
            "token": token,
        })),
    ))
}
