use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use messagely_types::api::{
    ReceivedMessagesResponse, SentMessagesResponse, UserResponse, UsersResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;

/// GET /users => `{users: [{username, first_name, last_name, phone}, ...]}`
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.directory.all().await?;
    Ok(Json(UsersResponse { users }))
}

/// GET /users/{username} => `{user: {..., join_at, last_login_at}}`
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.directory.get(&username).await?;
    Ok(Json(UserResponse { user }))
}

/// GET /users/{username}/to => `{msgs: [{id, from_user, body, sent_at, read_at}, ...]}`
pub async fn messages_to(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let msgs = state.directory.messages_to(&username).await?;
    Ok(Json(ReceivedMessagesResponse { msgs }))
}

/// GET /users/{username}/from => `{msgs: [{id, to_user, body, sent_at, read_at}, ...]}`
pub async fn messages_from(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let msgs = state.directory.messages_from(&username).await?;
    Ok(Json(SentMessagesResponse { msgs }))
}
