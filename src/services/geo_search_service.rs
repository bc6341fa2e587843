//! Búsqueda geográfica de vehículos disponibles
//!
//! El directorio se consulta con un rectángulo que contiene el círculo de
//! búsqueda; la distancia exacta se comprueba aquí. Dos fórmulas:
//!
//! * `Haversine`: distancia de gran círculo en km.
//! * `Planar`: comportamiento heredado, `sqrt(Δlat² + Δlong²)` en grados
//!   crudos comparado con el radio tal cual.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::models::vehicle::{Vehicle, VehicleType};
use crate::repositories::{BoundingBox, VehicleDirectory};
use crate::utils::errors::{AppResult, RentalError};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilómetros por grado de latitud
const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceFormula {
    #[default]
    Haversine,
    Planar,
}

impl FromStr for DistanceFormula {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "haversine" => Ok(DistanceFormula::Haversine),
            "planar" => Ok(DistanceFormula::Planar),
            other => Err(format!("unknown distance formula '{}'", other)),
        }
    }
}

impl fmt::Display for DistanceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceFormula::Haversine => f.write_str("haversine"),
            DistanceFormula::Planar => f.write_str("planar"),
        }
    }
}

impl DistanceFormula {
    pub fn distance(&self, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
        match self {
            DistanceFormula::Haversine => haversine_km(lat1, lon1, lat2, lon2),
            DistanceFormula::Planar => ((lat2 - lat1).powi(2) + (lon2 - lon1).powi(2)).sqrt(),
        }
    }

    /// Rectángulo que contiene todos los puntos a distancia <= radius
    pub fn bounding_box(&self, lat: f64, long: f64, radius: f64) -> BoundingBox {
        let (lat_span, long_span) = match self {
            DistanceFormula::Planar => (radius, Some(radius)),
            DistanceFormula::Haversine => {
                let lat_span = radius / KM_PER_DEGREE;
                let widest = lat.abs() + lat_span;
                // Cerca de los polos el círculo abarca todas las longitudes
                let long_span = (widest < 89.0)
                    .then(|| lat_span / widest.to_radians().cos());
                (lat_span, long_span)
            }
        };

        let (min_longitude, max_longitude) = match long_span {
            Some(span) if long - span >= -180.0 && long + span <= 180.0 => (long - span, long + span),
            _ => (-180.0, 180.0),
        };

        BoundingBox {
            min_latitude: (lat - lat_span).max(-90.0),
            max_latitude: (lat + lat_span).min(90.0),
            min_longitude,
            max_longitude,
        }
    }
}

pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Filtro por tipo: un tipo concreto o `All`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleTypeFilter {
    Any,
    Only(VehicleType),
}

impl VehicleTypeFilter {
    pub fn as_type(&self) -> Option<VehicleType> {
        match self {
            VehicleTypeFilter::Any => None,
            VehicleTypeFilter::Only(t) => Some(*t),
        }
    }
}

impl FromStr for VehicleTypeFilter {
    type Err = RentalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "All" {
            return Ok(VehicleTypeFilter::Any);
        }
        s.parse::<VehicleType>().map(VehicleTypeFilter::Only)
    }
}

#[derive(Clone)]
pub struct GeoSearch {
    directory: Arc<dyn VehicleDirectory>,
    formula: DistanceFormula,
}

impl GeoSearch {
    pub fn new(directory: Arc<dyn VehicleDirectory>, formula: DistanceFormula) -> Self {
        Self { directory, formula }
    }

    pub fn formula(&self) -> DistanceFormula {
        self.formula
    }

    /// Vehículos alquilables dentro del radio, del más cercano al más lejano
    pub async fn find_available(
        &self,
        lat: f64,
        long: f64,
        radius: f64,
        vehicle_type: &str,
    ) -> AppResult<Vec<Vehicle>> {
        let filter: VehicleTypeFilter = vehicle_type.parse()?;
        if radius.is_nan() || radius < 0.0 {
            return Ok(Vec::new());
        }

        let bounds = self.formula.bounding_box(lat, long, radius);
        let candidates = self
            .directory
            .find_rentable_within(bounds, filter.as_type())
            .await?;

        let mut found: Vec<(f64, Vehicle)> = candidates
            .into_iter()
            .filter(|v| v.can_be_rented)
            .filter(|v| filter.as_type().map_or(true, |t| v.vehicle_type == t))
            .map(|v| (self.formula.distance(lat, long, v.latitude, v.longitude), v))
            .filter(|(distance, _)| *distance <= radius)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0));

        debug!(
            "📍 Búsqueda ({}, {}) r={} [{}]: {} vehículos",
            lat,
            long,
            radius,
            self.formula,
            found.len()
        );
        Ok(found.into_iter().map(|(_, v)| v).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::NewVehicle;
    use crate::repositories::InMemoryStore;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    async fn add(store: &InMemoryStore, vehicle_type: VehicleType, lat: f64, long: f64, rentable: bool) -> Vehicle {
        VehicleDirectory::create(
            store,
            NewVehicle {
                owner_id: Uuid::new_v4(),
                vehicle_type,
                can_be_rented: rentable,
                model: "model".to_string(),
                color: "white".to_string(),
                identifier: format!("{}-{}", lat, long),
                description: None,
                latitude: lat,
                longitude: long,
                minute_price: Some(Decimal::from(5)),
                day_price: None,
            },
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_haversine_known_distance() {
        // Moscú - San Petersburgo, ~634 km
        let d = haversine_km(55.7558, 37.6173, 59.9311, 30.3609);
        assert!((d - 634.0).abs() < 5.0, "distance was {}", d);
        assert_eq!(haversine_km(10.0, 10.0, 10.0, 10.0), 0.0);
    }

    #[test]
    fn test_planar_distance_uses_raw_degrees() {
        let d = DistanceFormula::Planar.distance(0.0, 0.0, 3.0, 4.0);
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounding_box_contains_circle() {
        let formula = DistanceFormula::Haversine;
        let bounds = formula.bounding_box(55.0, 37.0, 10.0);
        // Un punto a ~9.9 km al este tiene que quedar dentro
        let east = 37.0 + 9.9 / (KM_PER_DEGREE * 55.0_f64.to_radians().cos());
        assert!(bounds.contains(55.0, east));
        assert!(formula.distance(55.0, 37.0, 55.0, east) <= 10.0);

        let polar = formula.bounding_box(89.5, 0.0, 200.0);
        assert_eq!((polar.min_longitude, polar.max_longitude), (-180.0, 180.0));
        assert_eq!(polar.max_latitude, 90.0);
    }

    #[test]
    fn test_type_filter_parsing() {
        assert_eq!("All".parse::<VehicleTypeFilter>(), Ok(VehicleTypeFilter::Any));
        assert_eq!(
            "Bike".parse::<VehicleTypeFilter>(),
            Ok(VehicleTypeFilter::Only(VehicleType::Bike))
        );
        assert!(matches!(
            "Truck".parse::<VehicleTypeFilter>(),
            Err(RentalError::InvalidVehicleType(_))
        ));
    }

    #[tokio::test]
    async fn test_find_available_filters_and_orders() {
        let store = InMemoryStore::new();
        let near = add(&store, VehicleType::Car, 55.751, 37.618, true).await;
        let nearer = add(&store, VehicleType::Scooter, 55.7505, 37.6175, true).await;
        add(&store, VehicleType::Car, 55.752, 37.619, false).await;
        add(&store, VehicleType::Car, 59.93, 30.36, true).await;

        let search = GeoSearch::new(Arc::new(store), DistanceFormula::Haversine);

        let all = search.find_available(55.75, 37.617, 5.0, "All").await.unwrap();
        assert_eq!(all, vec![nearer.clone(), near.clone()]);

        let cars = search.find_available(55.75, 37.617, 5.0, "Car").await.unwrap();
        assert_eq!(cars, vec![near]);

        let none = search.find_available(0.0, 0.0, 1.0, "All").await.unwrap();
        assert!(none.is_empty());

        let err = search.find_available(55.75, 37.617, 5.0, "Tank").await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_planar_formula_compares_degrees() {
        let store = InMemoryStore::new();
        let v = add(&store, VehicleType::Bike, 1.0, 1.0, true).await;
        let search = GeoSearch::new(Arc::new(store), DistanceFormula::Planar);

        assert_eq!(search.find_available(0.0, 0.0, 1.5, "All").await.unwrap(), vec![v]);
        assert!(search.find_available(0.0, 0.0, 1.4, "All").await.unwrap().is_empty());
    }
}
