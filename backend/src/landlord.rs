//! Landlord dashboard: own listings, received inquiries and totals.

use axum::extract::State;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{DashboardStats, Inquiry, Property};
use crate::state::AppState;

pub async fn my_properties(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Property>>, AppError> {
    let properties = state.repository.list_properties_by_owner(user.id).await?;
    log::info!("User {} owns {} properties", user.id, properties.len());
    Ok(Json(properties))
}

pub async fn my_inquiries(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Inquiry>>, AppError> {
    Ok(Json(state.repository.list_inquiries_for_owner(user.id).await?))
}

pub async fn dashboard_stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(state.repository.dashboard_stats(user.id).await?))
}
