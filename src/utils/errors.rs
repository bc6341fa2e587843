//! Sistema de manejo de errores
//!
//! Este módulo define los tipos de errores del sistema: los errores de dominio
//! del ciclo de vida de alquileres (`RentalError`) y los errores de aplicación
//! (`AppError`) con su conversión a respuestas HTTP.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errores de dominio del núcleo de alquileres
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RentalError {
    #[error("Vehicle not found")]
    VehicleNotFound,

    #[error("Rental not found")]
    RentalNotFound,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Vehicle cannot be rented right now")]
    NotRentable,

    #[error("Owners cannot rent their own vehicle")]
    SelfRentForbidden,

    #[error("Vehicle does not offer this rate unit")]
    RateNotOffered,

    #[error("Rental is already closed")]
    AlreadyClosed,

    #[error("Not enough money in the account balance")]
    InsufficientBalance,

    #[error("Invalid rate unit: {0}")]
    InvalidRateUnit(String),

    #[error("Invalid vehicle type: {0}")]
    InvalidVehicleType(String),

    #[error("End time must be after start time")]
    InvalidTimeRange,
}

impl RentalError {
    fn status(&self) -> StatusCode {
        match self {
            RentalError::VehicleNotFound
            | RentalError::RentalNotFound
            | RentalError::AccountNotFound => StatusCode::NOT_FOUND,
            RentalError::NotRentable | RentalError::AlreadyClosed => StatusCode::CONFLICT,
            RentalError::SelfRentForbidden => StatusCode::FORBIDDEN,
            RentalError::InsufficientBalance => StatusCode::PAYMENT_REQUIRED,
            RentalError::RateNotOffered
            | RentalError::InvalidRateUnit(_)
            | RentalError::InvalidVehicleType(_)
            | RentalError::InvalidTimeRange => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            RentalError::VehicleNotFound => "VEHICLE_NOT_FOUND",
            RentalError::RentalNotFound => "RENTAL_NOT_FOUND",
            RentalError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            RentalError::NotRentable => "NOT_RENTABLE",
            RentalError::SelfRentForbidden => "SELF_RENT_FORBIDDEN",
            RentalError::RateNotOffered => "RATE_NOT_OFFERED",
            RentalError::AlreadyClosed => "ALREADY_CLOSED",
            RentalError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            RentalError::InvalidRateUnit(_) => "INVALID_RATE_UNIT",
            RentalError::InvalidVehicleType(_) => "INVALID_VEHICLE_TYPE",
            RentalError::InvalidTimeRange => "INVALID_TIME_RANGE",
        }
    }
}

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Rental(#[from] RentalError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        details: None,
                        code: Some("DB_ERROR".to_string()),
                    },
                )
            }

            AppError::Validation(e) => {
                warn!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "The provided data is invalid".to_string(),
                        details: Some(json!(e)),
                        code: Some("VALIDATION_ERROR".to_string()),
                    },
                )
            }

            AppError::Rental(e) => {
                warn!("Rental error: {}", e);
                let status = e.status();
                (
                    status,
                    ErrorResponse {
                        error: status
                            .canonical_reason()
                            .unwrap_or("Rental Error")
                            .to_string(),
                        message: e.to_string(),
                        details: None,
                        code: Some(e.code().to_string()),
                    },
                )
            }

            AppError::Unauthorized(msg) => {
                warn!("Unauthorized access: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: "Unauthorized".to_string(),
                        message: msg,
                        details: None,
                        code: Some("UNAUTHORIZED".to_string()),
                    },
                )
            }

            AppError::Forbidden(msg) => {
                warn!("Forbidden access: {}", msg);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse {
                        error: "Forbidden".to_string(),
                        message: msg,
                        details: None,
                        code: Some("FORBIDDEN".to_string()),
                    },
                )
            }

            AppError::NotFound(msg) => {
                warn!("Resource not found: {}", msg);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse {
                        error: "Not Found".to_string(),
                        message: msg,
                        details: None,
                        code: Some("NOT_FOUND".to_string()),
                    },
                )
            }

            AppError::Conflict(msg) => {
                warn!("Conflict: {}", msg);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error: "Conflict".to_string(),
                        message: msg,
                        details: None,
                        code: Some("CONFLICT".to_string()),
                    },
                )
            }

            AppError::BadRequest(msg) => {
                warn!("Bad request: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Bad Request".to_string(),
                        message: msg,
                        details: None,
                        code: Some("BAD_REQUEST".to_string()),
                    },
                )
            }

            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: None,
                        code: Some("INTERNAL_ERROR".to_string()),
                    },
                )
            }

            AppError::Jwt(msg) => {
                warn!("JWT error: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: "JWT Error".to_string(),
                        message: msg,
                        details: None,
                        code: Some("JWT_ERROR".to_string()),
                    },
                )
            }

            AppError::Hash(msg) => {
                error!("Hash error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Hash Error".to_string(),
                        message: "An error occurred while processing credentials".to_string(),
                        details: None,
                        code: Some("HASH_ERROR".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

// Los extractores de axum responden en texto plano; así salen con el mismo cuerpo JSON
impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("custom");
    error.add_param("field".into(), &field);
    error.add_param("message".into(), &message);

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Traduce una violación de unicidad de PostgreSQL a `Conflict`
pub fn unique_violation_as_conflict(error: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message()),
        _ => AppError::Database(error),
    }
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}
