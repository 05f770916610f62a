use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::models::Statistics;
use crate::state::AppState;

/// Site-wide totals shown on the landing page.
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<Statistics>, AppError> {
    Ok(Json(state.repository.statistics().await?))
}
