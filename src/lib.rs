//! Backend de alquiler de vehículos
//!
//! Núcleo de alquileres (ciclo de vida, precios, búsqueda geográfica) con su
//! API HTTP en axum y almacenamiento en PostgreSQL o en memoria.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use state::AppState;
