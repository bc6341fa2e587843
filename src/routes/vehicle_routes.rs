use axum::{
    extract::{rejection::JsonRejection, Path, State},
    middleware,
    routing::{post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::dto::vehicle_dto::{VehicleRequest, VehicleResponse};
use crate::dto::ApiResponse;
use crate::middleware::auth::{auth_middleware, AuthenticatedUser};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router(state: AppState) -> Router<AppState> {
    let auth = middleware::from_fn_with_state(state, auth_middleware);

    Router::new()
        .route("/", post(create_vehicle).route_layer(auth.clone()))
        // route_layer solo cubre los métodos ya registrados: GET queda público
        .route(
            "/:id",
            put(update_vehicle)
                .delete(delete_vehicle)
                .route_layer(auth)
                .get(get_vehicle),
        )
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<VehicleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let Json(request) = payload?;
    let response = state.vehicles.create(user.account_id, request).await?;
    Ok(Json(response))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleResponse>, AppError> {
    let response = state.vehicles.get_by_id(id).await?;
    Ok(Json(response))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<VehicleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let Json(request) = payload?;
    let response = state.vehicles.update(user.account_id, id, request).await?;
    Ok(Json(response))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.vehicles.delete(user.account_id, id).await?;
    Ok(Json(ApiResponse::message("Vehículo eliminado exitosamente")))
}
