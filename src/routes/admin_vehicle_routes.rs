//! Rutas de administración de vehículos

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    middleware,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::dto::vehicle_dto::{AdminVehicleQuery, AdminVehicleRequest, VehicleResponse};
use crate::dto::ApiResponse;
use crate::middleware::auth::{admin_only_middleware, auth_middleware};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_admin_vehicle_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route("/:id", get(get_vehicle).put(update_vehicle).delete(delete_vehicle))
        .route_layer(middleware::from_fn(admin_only_middleware))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn list_vehicles(
    State(state): State<AppState>,
    query: Result<Query<AdminVehicleQuery>, QueryRejection>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.vehicles.admin_list(query).await?))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleResponse>, AppError> {
    Ok(Json(state.vehicles.get_by_id(id).await?))
}

async fn create_vehicle(
    State(state): State<AppState>,
    payload: Result<Json<AdminVehicleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let Json(request) = payload?;
    Ok(Json(state.vehicles.admin_create(request).await?))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AdminVehicleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let Json(request) = payload?;
    Ok(Json(state.vehicles.admin_update(id, request).await?))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.vehicles.admin_delete(id).await?;
    Ok(Json(ApiResponse::message("Vehículo eliminado")))
}
