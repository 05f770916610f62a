use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use crate::storage::{extension_for, property_image_key};

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub key: String,
}

/// Stores the multipart field `file` as a listing photo.
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or("image/jpeg").to_string();
        let extension = extension_for(&content_type).ok_or_else(|| {
            AppError::BadRequest("Invalid file type. Only images are allowed.".to_string())
        })?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("No file provided".to_string()));
        }

        let key = property_image_key(extension);
        let url = state.storage.put(&key, &bytes, &content_type).await?;
        log::info!("User {} uploaded {}", user.id, key);
        return Ok(Json(UploadResponse { url, key }));
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}
