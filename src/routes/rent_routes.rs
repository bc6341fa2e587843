//! Rutas de alquiler para usuarios
//!
//! La búsqueda es pública; el resto requiere token.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::rental_dto::{EndRentalQuery, RentalResponse, SearchQuery, StartRentalQuery};
use crate::dto::vehicle_dto::VehicleResponse;
use crate::dto::ApiResponse;
use crate::middleware::auth::{auth_middleware, AuthenticatedUser};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_rent_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/history", get(rental_history))
        .route("/vehicle-history/:id", get(vehicle_history))
        .route("/new/:vehicle_id", post(start_rental))
        .route("/end/:id", post(end_rental))
        .route("/:id", get(get_rental))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/vehicles", get(search_vehicles))
        .merge(protected)
}

async fn search_vehicles(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let Query(query) = query?;
    query.validate()?;
    let vehicles = state
        .geo_search
        .find_available(query.lat, query.long, query.radius, &query.vehicle_type)
        .await?;

    Ok(Json(vehicles.into_iter().map(VehicleResponse::from).collect()))
}

async fn get_rental(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<RentalResponse>, AppError> {
    let rental = state.rentals.get_rental(user.account_id, id).await?;
    Ok(Json(rental.into()))
}

async fn rental_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<RentalResponse>>, AppError> {
    let rentals = state.rentals.renter_history(user.account_id).await?;
    Ok(Json(rentals.into_iter().map(RentalResponse::from).collect()))
}

async fn vehicle_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<Vec<RentalResponse>>, AppError> {
    let rentals = state.rentals.vehicle_history(user.account_id, vehicle_id).await?;
    Ok(Json(rentals.into_iter().map(RentalResponse::from).collect()))
}

async fn start_rental(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(vehicle_id): Path<Uuid>,
    query: Result<Query<StartRentalQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<RentalResponse>>, AppError> {
    let Query(query) = query?;
    let rate_unit = query.rate_unit()?;
    let rental = state.rentals.start(user.account_id, vehicle_id, rate_unit).await?;

    Ok(Json(ApiResponse::success_with_message(
        rental.into(),
        "Alquiler iniciado",
    )))
}

async fn end_rental(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    query: Result<Query<EndRentalQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<RentalResponse>>, AppError> {
    let Query(query) = query?;
    let rental = state
        .rentals
        .end(user.account_id, id, query.lat, query.long)
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        rental.into(),
        "Alquiler terminado",
    )))
}
