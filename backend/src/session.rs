use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::resolve_user;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Current user, or `null` for anonymous callers and unusable tokens.
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Option<User>>, AppError> {
    match resolve_user(&state, &headers).await {
        Ok(user) => Ok(Json(Some(user))),
        Err(AppError::Unauthorized(reason)) => {
            log::debug!("Anonymous session: {}", reason);
            Ok(Json(None))
        }
        Err(e) => Err(e),
    }
}

/// Tokens are held by the client, so there is nothing to revoke here.
pub async fn logout() -> Json<Value> {
    Json(json!({ "success": true }))
}
