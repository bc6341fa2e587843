//! Modelo de Vehicle
//!
//! Vehículo alquilable: tipo, ubicación, bandera de disponibilidad y
//! precios por minuto / por día.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::rental::RateUnit;
use crate::utils::errors::RentalError;

/// Tipo de vehículo - conjunto cerrado
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VehicleType {
    Car,
    Bike,
    Scooter,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "Car",
            VehicleType::Bike => "Bike",
            VehicleType::Scooter => "Scooter",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = RentalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Car" => Ok(VehicleType::Car),
            "Bike" => Ok(VehicleType::Bike),
            "Scooter" => Ok(VehicleType::Scooter),
            other => Err(RentalError::InvalidVehicleType(other.to_string())),
        }
    }
}

/// Vehicle principal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vehicle {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub vehicle_type: VehicleType,
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

impl Vehicle {
    /// Precio ofrecido para la unidad dada; `None` si no está indicado o es cero
    pub fn price_for(&self, unit: RateUnit) -> Option<Decimal> {
        let price = match unit {
            RateUnit::Minutes => self.minute_price,
            RateUnit::Days => self.day_price,
        };
        price.filter(|p| *p > Decimal::ZERO)
    }

    pub fn is_owned_by(&self, account_id: Uuid) -> bool {
        self.owner_id == account_id
    }
}

/// Datos para registrar un vehículo nuevo
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub owner_id: Uuid,
    pub vehicle_type: VehicleType,
    pub can_be_rented: bool,
    pub model: String,
    pub color: String,
    pub identifier: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub minute_price: Option<Decimal>,
    pub day_price: Option<Decimal>,
}

impl NewVehicle {
    pub fn into_vehicle(self, id: Uuid, created_at: DateTime<Utc>) -> Vehicle {
        Vehicle {
            id,
            owner_id: self.owner_id,
            vehicle_type: self.vehicle_type,
            can_be_rented: self.can_be_rented,
            model: self.model,
            color: self.color,
            identifier: self.identifier,
            description: self.description,
            latitude: self.latitude,
            longitude: self.longitude,
            minute_price: self.minute_price,
            day_price: self.day_price,
            created_at,
        }
    }
}
