//! Repositorio en memoria
//!
//! Implementa los tres contratos sobre un único `RwLock`, de modo que cada
//! `commit` se aplica bajo una sola escritura. Se usa en los tests y con
//! `STORAGE_BACKEND=memory`.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AccountLedger, BoundingBox, RentalChanges, RentalRepository, RentalWrite, VehicleDirectory,
};
use crate::models::account::Account;
use crate::models::rental::Rental;
use crate::models::vehicle::{NewVehicle, Vehicle, VehicleType};
use crate::utils::errors::{AppError, AppResult};

#[derive(Default)]
struct Tables {
    vehicles: HashMap<Uuid, Vehicle>,
    accounts: HashMap<Uuid, Account>,
    rentals: HashMap<Uuid, Rental>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T>(items: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(0);
    let limit = usize::try_from(limit).unwrap_or(0);
    items.into_iter().skip(offset).take(limit).collect()
}

fn sorted_by_start(mut rentals: Vec<Rental>) -> Vec<Rental> {
    rentals.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    rentals
}

#[async_trait]
impl VehicleDirectory for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.tables.read().await.vehicles.get(&id).cloned())
    }

    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> AppResult<Option<Vehicle>> {
        let tables = self.tables.read().await;
        Ok(tables
            .vehicles
            .get(&id)
            .filter(|v| v.owner_id == owner_id)
            .cloned())
    }

    async fn find_rentable_within(
        &self,
        bounds: BoundingBox,
        vehicle_type: Option<VehicleType>,
    ) -> AppResult<Vec<Vehicle>> {
        let tables = self.tables.read().await;
        Ok(tables
            .vehicles
            .values()
            .filter(|v| v.can_be_rented)
            .filter(|v| vehicle_type.map_or(true, |t| v.vehicle_type == t))
            .filter(|v| bounds.contains(v.latitude, v.longitude))
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        offset: i64,
        limit: i64,
        vehicle_type: Option<VehicleType>,
    ) -> AppResult<Vec<Vehicle>> {
        let tables = self.tables.read().await;
        let mut vehicles: Vec<Vehicle> = tables
            .vehicles
            .values()
            .filter(|v| vehicle_type.map_or(true, |t| v.vehicle_type == t))
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(page(vehicles, offset, limit))
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let tables = self.tables.read().await;
        Ok(tables
            .vehicles
            .values()
            .filter(|v| v.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let vehicle = vehicle.into_vehicle(Uuid::new_v4(), Utc::now());
        self.tables
            .write()
            .await
            .vehicles
            .insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn save(&self, vehicle: &Vehicle) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        match tables.vehicles.get_mut(&vehicle.id) {
            Some(stored) => {
                *stored = vehicle.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("vehicle {}", vehicle.id))),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.tables.write().await.vehicles.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl AccountLedger for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<Account>> {
        let tables = self.tables.read().await;
        let mut accounts: Vec<Account> = tables.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(page(accounts, offset, limit))
    }

    async fn create(&self, account: &Account) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.accounts.values().any(|a| a.username == account.username) {
            return Err(AppError::Conflict(format!(
                "Account with username '{}' already exists",
                account.username
            )));
        }
        tables.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn save(&self, account: &Account) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .accounts
            .values()
            .any(|a| a.id != account.id && a.username == account.username);
        if taken {
            return Err(AppError::Conflict(format!(
                "Account with username '{}' already exists",
                account.username
            )));
        }
        match tables.accounts.get_mut(&account.id) {
            Some(stored) => {
                *stored = account.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("account {}", account.id))),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.tables.write().await.accounts.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl RentalRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Rental>> {
        Ok(self.tables.read().await.rentals.get(&id).cloned())
    }

    async fn find_by_renter(&self, renter_id: Uuid) -> AppResult<Vec<Rental>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_start(
            tables
                .rentals
                .values()
                .filter(|r| r.renter_id == renter_id)
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<Rental>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_start(
            tables
                .rentals
                .values()
                .filter(|r| r.vehicle_id == vehicle_id)
                .cloned()
                .collect(),
        ))
    }

    async fn find_open_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Option<Rental>> {
        let tables = self.tables.read().await;
        Ok(tables
            .rentals
            .values()
            .find(|r| r.vehicle_id == vehicle_id && r.is_open())
            .cloned())
    }

    async fn commit(&self, changes: RentalChanges) -> AppResult<()> {
        let mut tables = self.tables.write().await;

        // Validar todo antes de escribir nada
        for vehicle in &changes.vehicles {
            if !tables.vehicles.contains_key(&vehicle.id) {
                return Err(AppError::NotFound(format!("vehicle {}", vehicle.id)));
            }
        }
        for account in &changes.accounts {
            if !tables.accounts.contains_key(&account.id) {
                return Err(AppError::NotFound(format!("account {}", account.id)));
            }
        }
        match &changes.rental {
            Some(RentalWrite::Insert(rental)) if tables.rentals.contains_key(&rental.id) => {
                return Err(AppError::Conflict(format!("rental {} already exists", rental.id)));
            }
            Some(RentalWrite::Update(rental)) if !tables.rentals.contains_key(&rental.id) => {
                return Err(AppError::NotFound(format!("rental {}", rental.id)));
            }
            _ => {}
        }
        // Un solo alquiler abierto por vehículo, igual que el índice parcial de PostgreSQL
        if let Some(RentalWrite::Insert(rental) | RentalWrite::Update(rental)) = &changes.rental {
            let duplicate_open = rental.is_open()
                && tables
                    .rentals
                    .values()
                    .any(|r| r.id != rental.id && r.vehicle_id == rental.vehicle_id && r.is_open());
            if duplicate_open {
                return Err(AppError::Conflict(format!(
                    "vehicle {} already has an open rental",
                    rental.vehicle_id
                )));
            }
        }

        for vehicle in changes.vehicles {
            tables.vehicles.insert(vehicle.id, vehicle);
        }
        for account in changes.accounts {
            tables.accounts.insert(account.id, account);
        }
        match changes.rental {
            Some(RentalWrite::Insert(rental)) | Some(RentalWrite::Update(rental)) => {
                tables.rentals.insert(rental.id, rental);
            }
            Some(RentalWrite::Delete(id)) => {
                tables.rentals.remove(&id);
            }
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::Role;
    use crate::models::rental::RateUnit;
    use rust_decimal::Decimal;

    fn new_vehicle(owner_id: Uuid) -> NewVehicle {
        NewVehicle {
            owner_id,
            vehicle_type: VehicleType::Bike,
            can_be_rented: true,
            model: "Stels".to_string(),
            color: "red".to_string(),
            identifier: "B-17".to_string(),
            description: None,
            latitude: 10.0,
            longitude: 20.0,
            minute_price: Some(Decimal::from(3)),
            day_price: None,
        }
    }

    fn account(username: &str) -> Account {
        Account {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: "x".to_string(),
            role: Role::User,
            balance: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let mut vehicle = VehicleDirectory::create(&store, new_vehicle(Uuid::new_v4()))
            .await
            .unwrap();
        vehicle.can_be_rented = false;

        let rental = Rental::open(vehicle.id, Uuid::new_v4(), RateUnit::Minutes, Decimal::ONE, Utc::now());
        let ghost = account("ghost");

        let changes = RentalChanges::new()
            .save_vehicle(vehicle.clone())
            .save_account(ghost)
            .write_rental(RentalWrite::Insert(rental.clone()));
        assert!(store.commit(changes).await.is_err());

        let stored = VehicleDirectory::find_by_id(&store, vehicle.id).await.unwrap().unwrap();
        assert!(stored.can_be_rented);
        assert!(RentalRepository::find_by_id(&store, rental.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = InMemoryStore::new();
        AccountLedger::create(&store, &account("alice")).await.unwrap();
        let result = AccountLedger::create(&store, &account("alice")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_save_rejects_taken_username() {
        let store = InMemoryStore::new();
        AccountLedger::create(&store, &account("erin")).await.unwrap();
        let mut frank = account("frank");
        AccountLedger::create(&store, &frank).await.unwrap();

        frank.username = "erin".to_string();
        assert!(matches!(AccountLedger::save(&store, &frank).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_vehicle_pages_follow_creation_order() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        let mut created = Vec::new();
        for _ in 0..3 {
            created.push(VehicleDirectory::create(&store, new_vehicle(owner)).await.unwrap());
        }
        created.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let second_page = VehicleDirectory::list(&store, 1, 5, None).await.unwrap();
        assert_eq!(second_page, created[1..].to_vec());
        assert!(VehicleDirectory::list(&store, 0, 5, Some(VehicleType::Car))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.find_by_owner(owner).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rentable_filter_respects_bounds_and_type() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        let inside = VehicleDirectory::create(&store, new_vehicle(owner)).await.unwrap();
        let mut far = new_vehicle(owner);
        far.latitude = 40.0;
        VehicleDirectory::create(&store, far).await.unwrap();

        let bounds = BoundingBox {
            min_latitude: 9.0,
            max_latitude: 11.0,
            min_longitude: 19.0,
            max_longitude: 21.0,
        };
        let found = store.find_rentable_within(bounds, None).await.unwrap();
        assert_eq!(found, vec![inside.clone()]);

        let cars = store
            .find_rentable_within(bounds, Some(VehicleType::Car))
            .await
            .unwrap();
        assert!(cars.is_empty());
    }
}
