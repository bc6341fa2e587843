//! Modelo de Rental
//!
//! Un alquiler abierto no tiene cierre; uno cerrado tiene a la vez la hora de
//! fin y el precio final, guardados juntos en `RentalClosure`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::utils::errors::RentalError;

/// Unidad de tarificación
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RateUnit {
    Minutes,
    Days,
}

impl RateUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateUnit::Minutes => "Minutes",
            RateUnit::Days => "Days",
        }
    }

    /// Duración de una unidad en segundos
    pub fn unit_seconds(&self) -> i64 {
        match self {
            RateUnit::Minutes => 60,
            RateUnit::Days => 86_400,
        }
    }
}

impl fmt::Display for RateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateUnit {
    type Err = RentalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Minutes" => Ok(RateUnit::Minutes),
            "Days" => Ok(RateUnit::Days),
            other => Err(RentalError::InvalidRateUnit(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RentalState {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RentalClosure {
    pub ended_at: DateTime<Utc>,
    pub final_price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rental {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub renter_id: Uuid,
    pub rate_unit: RateUnit,
    pub price_per_unit: Decimal,
    pub started_at: DateTime<Utc>,
    pub closure: Option<RentalClosure>,
}

impl Rental {
    pub fn open(
        vehicle_id: Uuid,
        renter_id: Uuid,
        rate_unit: RateUnit,
        price_per_unit: Decimal,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id,
            renter_id,
            rate_unit,
            price_per_unit,
            started_at,
            closure: None,
        }
    }

    pub fn state(&self) -> RentalState {
        match self.closure {
            Some(_) => RentalState::Closed,
            None => RentalState::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.closure.is_none()
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.closure.as_ref().map(|c| c.ended_at)
    }

    pub fn final_price(&self) -> Option<Decimal> {
        self.closure.as_ref().map(|c| c.final_price)
    }

    /// Transición Open -> Closed; Closed es terminal
    pub fn close(&mut self, ended_at: DateTime<Utc>, final_price: Decimal) -> Result<(), RentalError> {
        if self.closure.is_some() {
            return Err(RentalError::AlreadyClosed);
        }
        if ended_at <= self.started_at {
            return Err(RentalError::InvalidTimeRange);
        }
        self.closure = Some(RentalClosure { ended_at, final_price });
        Ok(())
    }
}
