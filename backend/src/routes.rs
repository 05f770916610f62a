use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;
use crate::upload::MAX_UPLOAD_BYTES;
use crate::{favorite, inquiry, landlord, property, session, statistics, upload};

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/auth/me", get(session::me))
        .route("/auth/logout", post(session::logout))
        .route(
            "/properties",
            get(property::search_properties).post(property::create_property),
        )
        .route("/properties/map", get(property::property_map))
        .route(
            "/properties/:id",
            get(property::get_property)
                .patch(property::update_property)
                .delete(property::delete_property),
        )
        .route("/favorites", get(favorite::list_favorites))
        .route("/favorites/:id", get(favorite::is_favorite))
        .route("/favorites/:id/toggle", post(favorite::toggle_favorite))
        .route("/inquiries", post(inquiry::create_inquiry))
        .route("/statistics", get(statistics::get_stats))
        .route("/landlord/properties", get(landlord::my_properties))
        .route("/landlord/inquiries", get(landlord::my_inquiries))
        .route("/landlord/stats", get(landlord::dashboard_stats))
        .route(
            "/upload",
            post(upload::upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        );

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let database = state.repository.health_check().await?;
    Ok(Json(json!({ "status": "ok", "database": database })))
}
