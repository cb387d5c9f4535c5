use crate::{
    accounts::{self, AccountError},
    authentication::Credentials,
    startup::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    response::IntoResponse,
};
use secrecy::Secret;
use std::sync::Arc;

#[derive(serde::Deserialize)]
pub struct LoginData {
    email: String,
    password: Secret<String>,
}

#[tracing::instrument(name = "Log in", skip(state, payload))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginData>, JsonRejection>,
) -> Result<impl IntoResponse, AccountError> {
    let Json(body) = payload.map_err(|e| AccountError::Validation(e.body_text()))?;
    let credentials = Credentials {
        email: body.email,
        password: body.password,
    };
    let (user, token) =
        accounts::authenticate(state.users.as_ref(), &state.tokens, credentials).await?;
    Ok(Json(serde_json::json!({
        "message": "Login successful.",
        "token": token,
        "email": user.email,
    })))
}
