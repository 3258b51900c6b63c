use serde::{Deserialize, Serialize};

use crate::models::{ReceivedMessage, SentMessage, UserProfile, UserSummary};

// -- JWT Claims --

/// Claims signed into every bearer token. Only the username is asserted;
/// `iat`/`exp` are seconds since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub iat: usize,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of both `/login` and `/register` responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

// -- Users --

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: UserProfile,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SentMessagesResponse {
    pub msgs: Vec<SentMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceivedMessagesResponse {
    pub msgs: Vec<ReceivedMessage>,
}
