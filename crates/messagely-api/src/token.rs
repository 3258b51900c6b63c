use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

use messagely_types::api::Claims;

use crate::error::ApiError;

/// Signs `{username}` claims into HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, username: &str) -> Result<String, ApiError> {
        if self.ttl <= Duration::zero() {
            return Err(ApiError::Internal(format!("Token lifetime must be positive: {}", self.ttl)));
        }

        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ApiError::Internal(format!("Token lifetime out of range: {}", self.ttl)))?;
        let claims = Claims {
            username: username.to_string(),
            iat: now.timestamp() as usize,
            exp: expires.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.key)
            .map_err(|e| ApiError::Internal(format!("Token signing failed: {}", e)))
    }
}
