use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::extract::ApiPath;
use crate::models::Favorite;
use crate::property::find_property;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStatus {
    pub is_favorite: bool,
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(property_id): ApiPath<i32>,
) -> Result<Json<FavoriteStatus>, AppError> {
    find_property(&state, property_id).await?;
    let is_favorite = state.repository.toggle_favorite(user.id, property_id).await?;
    log::info!(
        "User {} {} property {}",
        user.id,
        if is_favorite { "saved" } else { "unsaved" },
        property_id
    );
    Ok(Json(FavoriteStatus { is_favorite }))
}

pub async fn list_favorites(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Favorite>>, AppError> {
    Ok(Json(state.repository.list_favorites(user.id).await?))
}

pub async fn is_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(property_id): ApiPath<i32>,
) -> Result<Json<FavoriteStatus>, AppError> {
    let is_favorite = state.repository.is_favorite(user.id, property_id).await?;
    Ok(Json(FavoriteStatus { is_favorite }))
}
