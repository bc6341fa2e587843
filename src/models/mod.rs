//! Modelos del sistema
//!
//! Este módulo contiene los modelos de dominio: cuentas, vehículos y
//! alquileres. Las filas de base de datos se convierten a estos tipos en
//! los repositorios.

pub mod account;
pub mod rental;
pub mod vehicle;
