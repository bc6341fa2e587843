//! Rutas de administración de cuentas

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

use crate::dto::auth_dto::{AccountResponse, AdminAccountRequest};
use crate::dto::{ApiResponse, PageQuery};
use crate::middleware::auth::{admin_only_middleware, auth_middleware};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_admin_account_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_accounts).post(create_account))
        .route("/:id", get(get_account).put(update_account).delete(delete_account))
        .route_layer(middleware::from_fn(admin_only_middleware))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn list_accounts(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.accounts.list(query).await?))
}

async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountResponse>, AppError> {
    Ok(Json(state.accounts.get_by_id(id).await?))
}

async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<AdminAccountRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AccountResponse>>, AppError> {
    let Json(request) = payload?;
    Ok(Json(state.accounts.create(request).await?))
}

async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AdminAccountRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AccountResponse>>, AppError> {
    let Json(request) = payload?;
    Ok(Json(state.accounts.update(id, request).await?))
}

async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.accounts.delete(id).await?;
    Ok(Json(ApiResponse::message("Cuenta eliminada")))
}
