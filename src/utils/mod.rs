//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación,
//! la fuente de tiempo y los locks por recurso.

pub mod clock;
pub mod errors;
pub mod locks;
pub mod validation;
