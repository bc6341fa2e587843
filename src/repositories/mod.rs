//! Repositorios
//!
//! Contratos (traits) que el núcleo de alquileres usa para acceder a los
//! datos, y sus adaptadores: PostgreSQL (sqlx) y memoria.
//!
//! Las escrituras del ciclo de vida pasan siempre por
//! `RentalRepository::commit`, que aplica un `RentalChanges` completo o nada.

pub mod account_repository;
pub mod memory_repository;
pub mod rental_repository;
pub mod vehicle_repository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::account::Account;
use crate::models::rental::Rental;
use crate::models::vehicle::{NewVehicle, Vehicle, VehicleType};
use crate::utils::errors::AppResult;

pub use account_repository::PgAccountRepository;
pub use memory_repository::InMemoryStore;
pub use rental_repository::PgRentalRepository;
pub use vehicle_repository::PgVehicleRepository;

/// Rectángulo lat/long usado como prefiltro de la búsqueda geográfica
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&latitude)
            && (self.min_longitude..=self.max_longitude).contains(&longitude)
    }
}

#[async_trait]
pub trait VehicleDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>>;

    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> AppResult<Option<Vehicle>>;

    /// Vehículos alquilables dentro del rectángulo, opcionalmente de un tipo
    async fn find_rentable_within(
        &self,
        bounds: BoundingBox,
        vehicle_type: Option<VehicleType>,
    ) -> AppResult<Vec<Vehicle>>;

    /// Página del catálogo completo, en orden de alta
    async fn list(
        &self,
        offset: i64,
        limit: i64,
        vehicle_type: Option<VehicleType>,
    ) -> AppResult<Vec<Vehicle>>;

    async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Vehicle>>;

    async fn create(&self, vehicle: NewVehicle) -> AppResult<Vehicle>;

    async fn save(&self, vehicle: &Vehicle) -> AppResult<()>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait AccountLedger: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>>;

    /// Página de cuentas, en orden de alta
    async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<Account>>;

    async fn create(&self, account: &Account) -> AppResult<()>;

    /// Guarda la cuenta completa; un username ya usado por otra es `Conflict`
    async fn save(&self, account: &Account) -> AppResult<()>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// Escritura sobre la tabla de alquileres dentro de un commit
#[derive(Debug, Clone, PartialEq)]
pub enum RentalWrite {
    Insert(Rental),
    Update(Rental),
    Delete(Uuid),
}

/// Conjunto de cambios que se aplican de forma atómica
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RentalChanges {
    pub vehicles: Vec<Vehicle>,
    pub accounts: Vec<Account>,
    pub rental: Option<RentalWrite>,
}

impl RentalChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_vehicle(mut self, vehicle: Vehicle) -> Self {
        self.vehicles.push(vehicle);
        self
    }

    pub fn save_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn write_rental(mut self, write: RentalWrite) -> Self {
        self.rental = Some(write);
        self
    }
}

#[async_trait]
pub trait RentalRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Rental>>;

    async fn find_by_renter(&self, renter_id: Uuid) -> AppResult<Vec<Rental>>;

    async fn find_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<Rental>>;

    async fn find_open_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Option<Rental>>;

    /// Aplica todos los cambios o ninguno
    async fn commit(&self, changes: RentalChanges) -> AppResult<()>;
}
