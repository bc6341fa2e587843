//! Rutas HTTP
//!
//! `create_router` monta todos los routers con sus capas de tracing y CORS.

pub mod account_routes;
pub mod admin_account_routes;
pub mod admin_rent_routes;
pub mod admin_vehicle_routes;
pub mod payment_routes;
pub mod rent_routes;
pub mod vehicle_routes;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::cors::cors_layer;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/account", account_routes::create_account_router(state.clone()))
        .nest("/api/payment", payment_routes::create_payment_router(state.clone()))
        .nest("/api/vehicle", vehicle_routes::create_vehicle_router(state.clone()))
        .nest("/api/rent", rent_routes::create_rent_router(state.clone()))
        .nest("/api/admin/account", admin_account_routes::create_admin_account_router(state.clone()))
        .nest("/api/admin/vehicle", admin_vehicle_routes::create_admin_vehicle_router(state.clone()))
        .nest("/api/admin/rent", admin_rent_routes::create_admin_rent_router(state.clone()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "environment": state.config.environment,
        "distance_formula": state.geo_search.formula().to_string(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
