use axum::{
    extract::{Path, State},
    middleware,
    routing::post,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::dto::auth_dto::AccountResponse;
use crate::dto::ApiResponse;
use crate::middleware::auth::{auth_middleware, AuthenticatedUser};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_payment_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/top-up/:account_id", post(top_up))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn top_up(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<ApiResponse<AccountResponse>>, AppError> {
    let account = state
        .payments
        .top_up(user.account_id, user.role, account_id)
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        account.into(),
        "Saldo recargado",
    )))
}
