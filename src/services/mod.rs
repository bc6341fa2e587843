//! Services module
//!
//! Este módulo contiene la lógica de negocio: el ciclo de vida de los
//! alquileres, el motor de precios, la búsqueda geográfica, la autenticación
//! y las recargas de saldo.

pub mod auth_service;
pub mod geo_search_service;
pub mod jwt_service;
pub mod payment_service;
pub mod pricing_service;
pub mod rental_service;
pub mod token_revocation;

pub use auth_service::AuthService;
pub use geo_search_service::{DistanceFormula, GeoSearch};
pub use jwt_service::{JwtConfig, JwtService, TokenIdentity};
pub use payment_service::PaymentService;
pub use rental_service::{AdminRental, RentalService};
pub use token_revocation::{InMemoryRevocation, TokenRevocation};
