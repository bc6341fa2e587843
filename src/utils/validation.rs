//! Utilidades de validación
//!
//! Funciones helper para validar coordenadas, precios y otros valores
//! que llegan desde la API antes de tocar el núcleo de alquileres.

use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

/// Validar formato de coordenadas GPS
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&lat) {
        let mut error = ValidationError::new("latitude");
        error.add_param("value".into(), &lat);
        error.add_param("range".into(), &"-90.0 to 90.0".to_string());
        return Err(error);
    }

    if !(-180.0..=180.0).contains(&lng) {
        let mut error = ValidationError::new("longitude");
        error.add_param("value".into(), &lng);
        error.add_param("range".into(), &"-180.0 to 180.0".to_string());
        return Err(error);
    }

    Ok(())
}

/// Validador custom de latitud para DTOs
pub fn validate_latitude(value: f64) -> Result<(), ValidationError> {
    validate_coordinates(value, 0.0)
}

/// Validador custom de longitud para DTOs
pub fn validate_longitude(value: f64) -> Result<(), ValidationError> {
    validate_coordinates(0.0, value)
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validador custom para precios de vehículo (`#[validate(custom = ...)]`)
pub fn validate_price(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(*value)
}

/// Validador custom para el precio por unidad de un alquiler
pub fn validate_unit_price(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive(*value)
}

/// Validar que un string no esté vacío
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(45.0, -75.0).is_ok());
        assert!(validate_coordinates(90.0, 180.0).is_ok());
        assert!(validate_coordinates(91.0, -75.0).is_err());
        assert!(validate_coordinates(45.0, -181.0).is_err());
    }

    #[test]
    fn test_validate_latitude_and_longitude() {
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(90.5).is_err());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(181.0).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(&dec(0)).is_ok());
        assert!(validate_price(&dec(15)).is_ok());
        assert!(validate_price(&dec(-1)).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(&dec(10)).is_ok());
        assert!(validate_unit_price(&dec(0)).is_err());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Tesla").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }
}
