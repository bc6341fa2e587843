//! Middleware de autenticación JWT
//!
//! Este módulo extrae el token Bearer, lo valida (firma, expiración y
//! revocación) e inyecta el `AuthenticatedUser` en las extensions.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Extension,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    models::account::Role,
    services::jwt_service::{extract_bearer, TokenIdentity},
    state::AppState,
    utils::errors::{forbidden_error, AppError},
};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub account_id: Uuid,
    pub role: Role,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn identity(&self) -> TokenIdentity {
        TokenIdentity {
            account_id: self.account_id,
            role: self.role,
            token_id: self.token_id,
            expires_at: self.expires_at,
        }
    }
}

impl From<TokenIdentity> for AuthenticatedUser {
    fn from(identity: TokenIdentity) -> Self {
        Self {
            account_id: identity.account_id,
            role: identity.role,
            token_id: identity.token_id,
            expires_at: identity.expires_at,
        }
    }
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

    let token = extract_bearer(auth_header)?;
    let identity = state.auth.authenticate(token).await?;

    request.extensions_mut().insert(AuthenticatedUser::from(identity));
    Ok(next.run(request).await)
}

/// Solo administradores. Va detrás de `auth_middleware`.
pub async fn admin_only_middleware(
    Extension(user): Extension<AuthenticatedUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !user.is_admin() {
        return Err(forbidden_error("access admin endpoints", "admin role required"));
    }
    Ok(next.run(request).await)
}
