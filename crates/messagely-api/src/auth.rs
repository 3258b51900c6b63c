use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use tracing::{info, warn};

use messagely_types::api::{LoginRequest, RegisterRequest, TokenResponse};

use crate::directory::UserDirectory;
use crate::error::ApiError;
use crate::token::TokenIssuer;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub directory: UserDirectory,
    pub tokens: TokenIssuer,
}

/// POST /login: `{username, password}` => `{token}`, stamping last-login.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    if !state.directory.authenticate(&req.username, &req.password).await? {
        warn!("Failed login for {}", req.username);
        return Err(ApiError::InvalidCredentials);
    }

    state.directory.update_login_timestamp(&req.username).await?;
    let token = state.tokens.issue(&req.username)?;

    info!("User {} logged in", req.username);
    Ok(Json(TokenResponse { token }))
}

/// POST /register: creates the user, logs them in and returns `{token}`.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    if req.username.trim().is_empty() {
        return Err(ApiError::Validation("username must not be empty".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::Validation("password must not be empty".into()));
    }

    let user = state.directory.register(req).await?;
    let token = state.tokens.issue(&user.username)?;
    state.directory.update_login_timestamp(&user.username).await?;

    Ok(Json(TokenResponse { token }))
}
