//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Todos los servicios comparten los mismos
//! puertos, el mismo `KeyedLocks` y el mismo reloj.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::controllers::{AccountController, VehicleController};
use crate::repositories::{
    AccountLedger, InMemoryStore, PgAccountRepository, PgRentalRepository, PgVehicleRepository,
    RentalRepository, VehicleDirectory,
};
use crate::services::{
    AuthService, GeoSearch, InMemoryRevocation, JwtConfig, JwtService, PaymentService, RentalService,
};
use crate::utils::clock::Clock;
use crate::utils::locks::KeyedLocks;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub rentals: RentalService,
    pub geo_search: GeoSearch,
    pub vehicles: VehicleController,
    pub accounts: AccountController,
    pub auth: AuthService,
    pub payments: PaymentService,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        vehicles: Arc<dyn VehicleDirectory>,
        accounts: Arc<dyn AccountLedger>,
        rentals: Arc<dyn RentalRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let locks = KeyedLocks::new();
        let jwt = JwtService::new(JwtConfig::from(&config));

        Self {
            rentals: RentalService::new(
                vehicles.clone(),
                accounts.clone(),
                rentals.clone(),
                locks.clone(),
                clock.clone(),
            ),
            geo_search: GeoSearch::new(vehicles.clone(), config.distance_formula),
            vehicles: VehicleController::new(
                vehicles.clone(),
                accounts.clone(),
                rentals.clone(),
                locks.clone(),
            ),
            accounts: AccountController::new(
                accounts.clone(),
                vehicles,
                rentals,
                locks.clone(),
                clock.clone(),
                config.bcrypt_cost,
            ),
            auth: AuthService::new(
                accounts.clone(),
                jwt,
                Arc::new(InMemoryRevocation::new()),
                clock,
                config.bcrypt_cost,
            ),
            payments: PaymentService::new(accounts, locks, config.top_up_amount),
            config,
        }
    }

    /// Estado sobre PostgreSQL
    pub fn with_postgres(config: EnvironmentConfig, pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            config,
            Arc::new(PgVehicleRepository::new(pool.clone())),
            Arc::new(PgAccountRepository::new(pool.clone())),
            Arc::new(PgRentalRepository::new(pool)),
            clock,
        )
    }

    /// Estado sobre el almacén en memoria
    pub fn in_memory(config: EnvironmentConfig, clock: Arc<dyn Clock>) -> Self {
        let store = InMemoryStore::new();
        Self::new(
            config,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            clock,
        )
    }
}
