//! Controllers
//!
//! Lógica de los endpoints que no pertenece al núcleo de alquileres.

pub mod account_controller;
pub mod vehicle_controller;

pub use account_controller::AccountController;
pub use vehicle_controller::VehicleController;
