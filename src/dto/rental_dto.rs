use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::rental::{RateUnit, Rental, RentalState};
use crate::services::rental_service::AdminRental;
use crate::utils::errors::{AppResult, RentalError};
use crate::utils::validation::{validate_latitude, validate_longitude, validate_unit_price};

fn all_types() -> String {
    "All".to_string()
}

// Query de búsqueda: ?lat=..&long=..&radius=..&vehicle_type=..
#[derive(Debug, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(custom = "validate_latitude")]
    pub lat: f64,
    #[validate(custom = "validate_longitude")]
    pub long: f64,
    pub radius: f64,
    #[serde(default = "all_types")]
    pub vehicle_type: String,
}

// Query para empezar un alquiler: ?rate_unit=Minutes|Days
#[derive(Debug, Deserialize)]
pub struct StartRentalQuery {
    pub rate_unit: String,
}

impl StartRentalQuery {
    pub fn rate_unit(&self) -> Result<RateUnit, RentalError> {
        self.rate_unit.parse()
    }
}

// Query para terminar un alquiler: posición final del vehículo
#[derive(Debug, Deserialize)]
pub struct EndRentalQuery {
    pub lat: f64,
    pub long: f64,
}

// Alquiler creado o reemplazado por un administrador
#[derive(Debug, Deserialize, Validate)]
pub struct AdminRentalRequest {
    pub vehicle_id: Uuid,
    pub renter_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub rate_unit: String,
    #[validate(custom = "validate_unit_price")]
    pub price_per_unit: Decimal,
}

impl AdminRentalRequest {
    pub fn into_admin_rental(self) -> AppResult<AdminRental> {
        self.validate()?;
        let rate_unit = self.rate_unit.parse::<RateUnit>()?;
        if matches!(self.ended_at, Some(ended_at) if ended_at <= self.started_at) {
            return Err(RentalError::InvalidTimeRange.into());
        }

        Ok(AdminRental {
            vehicle_id: self.vehicle_id,
            renter_id: self.renter_id,
            started_at: self.started_at,
            ended_at: self.ended_at,
            rate_unit,
            price_per_unit: self.price_per_unit,
        })
    }
}

// Response de alquiler
#[derive(Debug, Serialize)]
pub struct RentalResponse {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub renter_id: Uuid,
    pub state: RentalState,
    pub rate_unit: &'static str,
    pub price_per_unit: Decimal,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub final_price: Option<Decimal>,
}

impl From<Rental> for RentalResponse {
    fn from(rental: Rental) -> Self {
        Self {
            id: rental.id,
            vehicle_id: rental.vehicle_id,
            renter_id: rental.renter_id,
            state: rental.state(),
            rate_unit: rental.rate_unit.as_str(),
            price_per_unit: rental.price_per_unit,
            started_at: rental.started_at,
            ended_at: rental.ended_at(),
            final_price: rental.final_price(),
        }
    }
}
