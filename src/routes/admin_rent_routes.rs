//! Rutas de administración de alquileres

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    middleware,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::dto::rental_dto::{AdminRentalRequest, EndRentalQuery, RentalResponse};
use crate::dto::ApiResponse;
use crate::middleware::auth::{admin_only_middleware, auth_middleware};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_admin_rent_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_rental))
        .route("/user-history/:id", get(user_history))
        .route("/vehicle-history/:id", get(vehicle_history))
        .route("/end/:id", post(end_rental))
        .route("/:id", get(get_rental).put(update_rental).delete(delete_rental))
        // El último route_layer es el exterior: primero autenticar, luego el rol
        .route_layer(middleware::from_fn(admin_only_middleware))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn get_rental(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RentalResponse>, AppError> {
    Ok(Json(state.rentals.admin_get_rental(id).await?.into()))
}

async fn user_history(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Vec<RentalResponse>>, AppError> {
    let rentals = state.rentals.admin_renter_history(account_id).await?;
    Ok(Json(rentals.into_iter().map(RentalResponse::from).collect()))
}

async fn vehicle_history(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<Vec<RentalResponse>>, AppError> {
    let rentals = state.rentals.admin_vehicle_history(vehicle_id).await?;
    Ok(Json(rentals.into_iter().map(RentalResponse::from).collect()))
}

async fn create_rental(
    State(state): State<AppState>,
    payload: Result<Json<AdminRentalRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RentalResponse>>, AppError> {
    let Json(request) = payload?;
    let rental = state.rentals.admin_create(request.into_admin_rental()?).await?;
    Ok(Json(ApiResponse::success_with_message(rental.into(), "Alquiler creado")))
}

async fn end_rental(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    query: Result<Query<EndRentalQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<RentalResponse>>, AppError> {
    let Query(query) = query?;
    let rental = state.rentals.admin_end(id, query.lat, query.long).await?;
    Ok(Json(ApiResponse::success_with_message(rental.into(), "Alquiler terminado")))
}

async fn update_rental(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AdminRentalRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RentalResponse>>, AppError> {
    let Json(request) = payload?;
    let rental = state.rentals.admin_update(id, request.into_admin_rental()?).await?;
    Ok(Json(ApiResponse::success_with_message(rental.into(), "Alquiler actualizado")))
}

async fn delete_rental(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.rentals.admin_delete(id).await?;
    Ok(Json(ApiResponse::message("Alquiler eliminado")))
}
