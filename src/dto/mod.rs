//! DTOs de la API
//!
//! Requests validados con `validator` y responses serializables.

pub mod auth_dto;
pub mod rental_dto;
pub mod vehicle_dto;

use serde::{Deserialize, Serialize};
use validator::Validate;

// Response genérica
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

// Paginación `?start=&count=` de los listados de administración
#[derive(Debug, Deserialize, Validate)]
pub struct PageQuery {
    #[validate(range(min = 0))]
    pub start: i64,
    #[validate(range(min = 0, max = 500))]
    pub count: i64,
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}
