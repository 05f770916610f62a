//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs minted by the identity provider with the user's
//! `openId` as subject. The service never issues session cookies; it only
//! validates tokens and keeps the `users` table in step with their claims.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;
use crate::models::{Role, UpsertUser, User};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String, // openId
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_method: Option<String>,
    pub exp: usize,
}

impl Claims {
    /// Claims for `open_id` expiring 24 hours from now.
    pub fn new(open_id: impl Into<String>) -> Self {
        let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;
        Self {
            sub: open_id.into(),
            name: None,
            email: None,
            login_method: None,
            exp,
        }
    }

    pub fn with_profile(mut self, name: &str, email: &str, login_method: &str) -> Self {
        self.name = Some(name.to_string());
        self.email = Some(email.to_string());
        self.login_method = Some(login_method.to_string());
        self
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,
    #[error("Invalid Authorization header format")]
    InvalidFormat,
    #[error("Invalid or expired token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

pub fn create_token(claims: &Claims, jwt_secret: &str) -> Result<String, AuthError> {
    let token = encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;
    value
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

/// Shared secret and the identity that is promoted to admin on sign-in.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub owner_open_id: Option<String>,
}

/// Resolves the caller's user row. The row is created the first time an
/// identity is seen and its profile and `last_signed_in` are refreshed on
/// every authenticated request.
pub async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let token = bearer_token(headers)?;
    let claims = validate_token(token, &state.auth.jwt_secret)?;

    let known = state.repository.get_user_by_open_id(&claims.sub).await?.is_some();
    let is_owner = state.auth.owner_open_id.as_deref() == Some(claims.sub.as_str());
    let user = state
        .repository
        .upsert_user(UpsertUser {
            open_id: claims.sub,
            name: claims.name,
            email: claims.email,
            login_method: claims.login_method,
            role: is_owner.then_some(Role::Admin),
            last_signed_in: Utc::now(),
        })
        .await?;
    if !known {
        log::info!("Registered user {} ({})", user.id, user.open_id);
    }
    Ok(user)
}

/// The authenticated caller. Handlers that take this reject anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_user(state, &parts.headers).await.map(AuthUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trips_claims() {
        let claims = Claims::new("oid-42").with_profile("Anna", "anna@example.com", "google");
        let token = create_token(&claims, SECRET).unwrap();
        assert_eq!(validate_token(&token, SECRET).unwrap(), claims);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token(&Claims::new("oid-42"), SECRET).unwrap();
        assert!(matches!(
            validate_token(&token, "other-secret"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = Claims::new("oid-42");
        claims.exp = (Utc::now() - Duration::hours(2)).timestamp() as usize;
        let token = create_token(&claims, SECRET).unwrap();
        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(AuthError::MissingHeader)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(bearer_token(&headers), Err(AuthError::InvalidFormat)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");
    }
}
