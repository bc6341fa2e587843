use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::vehicle::{NewVehicle, Vehicle, VehicleType};
use crate::utils::errors::AppResult;
use crate::utils::validation::{validate_latitude, validate_longitude, validate_not_blank, validate_price};

// Request para crear o reemplazar un vehículo
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VehicleRequest {
    pub can_be_rented: bool,
    pub vehicle_type: String,
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub model: String,
    #[validate(length(min = 1, max = 50), custom = "validate_not_blank")]
    pub color: String,
    #[validate(length(min = 1, max = 50), custom = "validate_not_blank")]
    pub identifier: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(custom = "validate_latitude")]
    pub latitude: f64,
    #[validate(custom = "validate_longitude")]
    pub longitude: f64,
    #[validate(custom = "validate_price")]
    pub minute_price: Option<Decimal>,
    #[validate(custom = "validate_price")]
    pub day_price: Option<Decimal>,
}

impl VehicleRequest {
    /// Validar y convertir a datos de dominio
    pub fn into_new_vehicle(self, owner_id: Uuid) -> AppResult<NewVehicle> {
        self.validate()?;
        let vehicle_type = self.vehicle_type.parse::<VehicleType>()?;

        Ok(NewVehicle {
            owner_id,
            vehicle_type,
            can_be_rented: self.can_be_rented,
            model: self.model.trim().to_string(),
            color: self.color.trim().to_string(),
            identifier: self.identifier.trim().to_string(),
            description: self.description,
            latitude: self.latitude,
            longitude: self.longitude,
            minute_price: self.minute_price,
            day_price: self.day_price,
        })
    }
}

// Alta o reemplazo de un vehículo por un administrador, para cualquier propietario
#[derive(Debug, Clone, Deserialize)]
pub struct AdminVehicleRequest {
    pub owner_id: Uuid,
    #[serde(flatten)]
    pub vehicle: VehicleRequest,
}

impl AdminVehicleRequest {
    pub fn into_new_vehicle(self) -> AppResult<NewVehicle> {
        self.vehicle.into_new_vehicle(self.owner_id)
    }
}

fn all_types() -> String {
    "All".to_string()
}

// Listado paginado del catálogo completo
#[derive(Debug, Deserialize, Validate)]
pub struct AdminVehicleQuery {
    #[validate(range(min = 0))]
    pub start: i64,
    #[validate(range(min = 0, max = 500))]
    pub count: i64,
    #[serde(default = "all_types")]
    pub vehicle_type: String,
}

// Response de vehículo
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub vehicle_type: &'static str,
    pub can_be_rented: bool,
    pub model: String,
    pub color: String,
    pub identifier: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub minute_price: Option<Decimal>,
    pub day_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            owner_id: vehicle.owner_id,
            vehicle_type: vehicle.vehicle_type.as_str(),
            can_be_rented: vehicle.can_be_rented,
            model: vehicle.model,
            color: vehicle.color,
            identifier: vehicle.identifier,
            description: vehicle.description,
            latitude: vehicle.latitude,
            longitude: vehicle.longitude,
            minute_price: vehicle.minute_price,
            day_price: vehicle.day_price,
            created_at: vehicle.created_at,
        }
    }
}
