//! Motor de precios
//!
//! `amount = ceil(elapsed / unit) * price_per_unit`: toda unidad empezada se
//! cobra completa. Función pura, sin I/O.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::rental::RateUnit;
use crate::utils::errors::RentalError;

/// Número de unidades a cobrar por el intervalo (siempre redondeado hacia arriba)
pub fn billable_units(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    unit: RateUnit,
) -> Result<i64, RentalError> {
    let elapsed_ms = (end - start).num_milliseconds();
    if elapsed_ms <= 0 {
        return Err(RentalError::InvalidTimeRange);
    }
    let unit_ms = unit.unit_seconds() * 1000;
    Ok((elapsed_ms + unit_ms - 1) / unit_ms)
}

/// Precio final de un alquiler
pub fn price(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    unit: RateUnit,
    price_per_unit: Decimal,
) -> Result<Decimal, RentalError> {
    if price_per_unit <= Decimal::ZERO {
        return Err(RentalError::RateNotOffered);
    }
    let units = billable_units(start, end, unit)?;
    // Un intervalo tan largo que desborda Decimal no es un rango válido
    Decimal::from(units)
        .checked_mul(price_per_unit)
        .ok_or(RentalError::InvalidTimeRange)
}
