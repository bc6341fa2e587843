use axum::{
    extract::{rejection::JsonRejection, State},
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::dto::auth_dto::{AccountResponse, CredentialsRequest, TokenResponse};
use crate::dto::ApiResponse;
use crate::middleware::auth::{auth_middleware, AuthenticatedUser};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_account_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/sign-out", post(sign_out))
        .route("/me", get(me))
        .route("/update", put(update_account))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .merge(protected)
}

async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AccountResponse>>, AppError> {
    let Json(request) = payload?;
    request.validate()?;
    let account = state.auth.sign_up(&request.username, &request.password).await?;
    Ok(Json(ApiResponse::success_with_message(
        account.into(),
        "Cuenta creada exitosamente",
    )))
}

async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(request) = payload?;
    let token = state.auth.sign_in(&request.username, &request.password).await?;
    Ok(Json(TokenResponse::bearer(token)))
}

async fn sign_out(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<ApiResponse<()>> {
    state.auth.sign_out(&user.identity()).await;
    Json(ApiResponse::message("Sesión cerrada"))
}

async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state.auth.me(user.account_id).await?;
    Ok(Json(account.into()))
}

async fn update_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AccountResponse>>, AppError> {
    let Json(request) = payload?;
    let response = state.accounts.update_own(user.account_id, request).await?;
    Ok(Json(response))
}
