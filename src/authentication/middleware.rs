use super::{Claims, TokenError};
use crate::{
    domain::{Role, UserId},
    error_handling::{error_chain_fmt, json_error},
    startup::AppState,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Identity asserted by a verified bearer token, made available to
/// handlers as a request extension.
#[derive(Copy, Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub role: Role,
}

impl AuthenticatedUser {
    /// Admins may act on any account, everybody else only on their own.
    pub fn may_manage(&self, user_id: UserId) -> bool {
        self.role.is_admin() || self.user_id == user_id
    }
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

#[derive(thiserror::Error)]
pub enum AccessError {
    #[error("Missing bearer token.")]
    MissingToken,
    #[error("Invalid or expired token.")]
    InvalidToken(#[source] TokenError),
    #[error("You are not allowed to perform this action.")]
    Forbidden,
}

impl std::fmt::Debug for AccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        tracing::warn!("{self:?}");
        match self {
            AccessError::MissingToken | AccessError::InvalidToken(_) => {
                let mut response = json_error(StatusCode::UNAUTHORIZED, self.to_string());
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Bearer"),
                );
                response
            }
            AccessError::Forbidden => json_error(StatusCode::FORBIDDEN, self.to_string()),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AccessError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AccessError::MissingToken)
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser, AccessError> {
    let token = bearer_token(headers)?;
    let claims = state
        .tokens
        .verify(token)
        .map_err(AccessError::InvalidToken)?;
    Ok(claims.into())
}

/// Middleware that rejects requests without a valid bearer token.
pub async fn reject_anonymous_users<B>(
    State(state): State<Arc<AppState>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, AccessError> {
    let user = authenticate(&state, request.headers())?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Middleware for administrative routes: a valid token is not enough, it
/// must also carry the `admin` role.
pub async fn reject_non_admin_users<B>(
    State(state): State<Arc<AppState>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, AccessError> {
    let user = authenticate(&state, request.headers())?;
    if !user.role.is_admin() {
        tracing::warn!(user_id = %user.user_id, "Non-admin user tried to reach an admin route.");
        return Err(AccessError::Forbidden);
    }
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
