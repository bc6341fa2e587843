//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno. `Default` da valores de
//! desarrollo; `from_env` los sobreescribe con las variables presentes.

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;

use crate::services::geo_search_service::DistanceFormula;

/// Dónde se guardan vehículos, cuentas y alquileres
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("unknown storage backend '{}'", other)),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub storage_backend: StorageBackend,
    pub jwt_secret: String,
    /// Vida de los tokens en segundos
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub bcrypt_cost: u32,
    pub distance_formula: DistanceFormula,
    pub top_up_amount: Decimal,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub log_level: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            storage_backend: StorageBackend::Postgres,
            jwt_secret: "dev-secret-change-me".to_string(),
            jwt_expiration: 86_400,
            cors_origins: Vec::new(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            distance_formula: DistanceFormula::Haversine,
            top_up_amount: Decimal::from(250_000),
            admin_username: None,
            admin_password: None,
            log_level: "info".to_string(),
        }
    }
}

impl EnvironmentConfig {
    /// Leer la configuración desde las variables de entorno
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT")?.unwrap_or(defaults.port),
            database_url: env::var("DATABASE_URL").ok(),
            storage_backend: parse_var("STORAGE_BACKEND")?.unwrap_or(defaults.storage_backend),
            jwt_secret: env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_expiration: parse_var("JWT_EXPIRATION")?.unwrap_or(defaults.jwt_expiration),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            bcrypt_cost: parse_var("BCRYPT_COST")?.unwrap_or(defaults.bcrypt_cost),
            distance_formula: match env::var("GEO_DISTANCE_FORMULA") {
                Ok(value) => value.parse::<DistanceFormula>().map_err(|e| anyhow!(e))?,
                Err(_) => defaults.distance_formula,
            },
            top_up_amount: parse_var("BALANCE_TOP_UP_AMOUNT")?.unwrap_or(defaults.top_up_amount),
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        if config.is_production() && config.jwt_secret == Self::default().jwt_secret {
            return Err(anyhow!("JWT_SECRET must be set in production"));
        }
        if config.storage_backend == StorageBackend::Postgres && config.database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set when STORAGE_BACKEND=postgres"));
        }

        Ok(config)
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("{} has an invalid value '{}'", name, raw)),
        Err(_) => Ok(None),
    }
}
