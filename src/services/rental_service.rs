//! Ciclo de vida de los alquileres
//!
//! Estados: inexistente -> abierto -> cerrado (terminal). Cada operación de
//! escritura toma los locks de todos los recursos que toca, relee el estado
//! con los locks tomados y entrega todas sus escrituras en un único
//! `RentalChanges`, así que un fallo nunca deja cambios a medias.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::rental::{RateUnit, Rental, RentalClosure};
use crate::models::vehicle::Vehicle;
use crate::repositories::{
    AccountLedger, RentalChanges, RentalRepository, RentalWrite, VehicleDirectory,
};
use crate::services::pricing_service;
use crate::utils::clock::Clock;
use crate::utils::errors::{validation_error, AppError, AppResult, RentalError};
use crate::utils::locks::{KeyedLocks, LockSet};
use crate::utils::validation::validate_coordinates;

/// Reintentos para fijar los locks de un alquiler que cambia de vehículo o
/// arrendatario mientras se espera
const LOCK_ATTEMPTS: usize = 3;

/// Alquiler tal como lo describe un administrador
#[derive(Debug, Clone, PartialEq)]
pub struct AdminRental {
    pub vehicle_id: Uuid,
    pub renter_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub rate_unit: RateUnit,
    pub price_per_unit: Decimal,
}

#[derive(Clone)]
pub struct RentalService {
    vehicles: Arc<dyn VehicleDirectory>,
    accounts: Arc<dyn AccountLedger>,
    rentals: Arc<dyn RentalRepository>,
    locks: KeyedLocks,
    clock: Arc<dyn Clock>,
}

impl RentalService {
    pub fn new(
        vehicles: Arc<dyn VehicleDirectory>,
        accounts: Arc<dyn AccountLedger>,
        rentals: Arc<dyn RentalRepository>,
        locks: KeyedLocks,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            vehicles,
            accounts,
            rentals,
            locks,
            clock,
        }
    }

    // ---------------------------------------------------------------
    // Flujo de usuario
    // ---------------------------------------------------------------

    /// Empezar un alquiler al precio vigente del vehículo
    pub async fn start(&self, renter_id: Uuid, vehicle_id: Uuid, rate_unit: RateUnit) -> AppResult<Rental> {
        let _locks = self.locks.acquire(&[vehicle_id, renter_id]).await;

        self.account_exists(renter_id).await?;
        let mut vehicle = self.vehicle(vehicle_id).await?;
        if !vehicle.can_be_rented {
            return Err(RentalError::NotRentable.into());
        }
        if vehicle.is_owned_by(renter_id) {
            return Err(RentalError::SelfRentForbidden.into());
        }
        let price_per_unit = vehicle
            .price_for(rate_unit)
            .ok_or(RentalError::RateNotOffered)?;

        let rental = Rental::open(vehicle.id, renter_id, rate_unit, price_per_unit, self.clock.now());
        vehicle.can_be_rented = false;

        self.rentals
            .commit(
                RentalChanges::new()
                    .save_vehicle(vehicle)
                    .write_rental(RentalWrite::Insert(rental.clone())),
            )
            .await?;

        info!(
            "🚗 Alquiler {} iniciado: vehículo {} por {} ({} a {})",
            rental.id, rental.vehicle_id, renter_id, rental.rate_unit, rental.price_per_unit
        );
        Ok(rental)
    }

    /// Terminar un alquiler propio: cobra, libera y reubica el vehículo
    pub async fn end(&self, renter_id: Uuid, rental_id: Uuid, latitude: f64, longitude: f64) -> AppResult<Rental> {
        let (rental, _locks) = self.lock_rental(rental_id, &[]).await?;
        if rental.renter_id != renter_id {
            return Err(RentalError::RentalNotFound.into());
        }
        self.close(rental, latitude, longitude).await
    }

    pub async fn get_rental(&self, account_id: Uuid, rental_id: Uuid) -> AppResult<Rental> {
        let rental = self.rental(rental_id).await?;
        if rental.renter_id == account_id {
            return Ok(rental);
        }
        match self.vehicles.find_by_id(rental.vehicle_id).await? {
            Some(vehicle) if vehicle.is_owned_by(account_id) => Ok(rental),
            _ => Err(RentalError::RentalNotFound.into()),
        }
    }

    pub async fn renter_history(&self, renter_id: Uuid) -> AppResult<Vec<Rental>> {
        self.rentals.find_by_renter(renter_id).await
    }

    /// Historial de un vehículo; solo para su propietario
    pub async fn vehicle_history(&self, owner_id: Uuid, vehicle_id: Uuid) -> AppResult<Vec<Rental>> {
        self.vehicles
            .find_owned(owner_id, vehicle_id)
            .await?
            .ok_or(RentalError::VehicleNotFound)?;
        self.rentals.find_by_vehicle(vehicle_id).await
    }

    // ---------------------------------------------------------------
    // Flujo de administrador
    // ---------------------------------------------------------------

    pub async fn admin_get_rental(&self, rental_id: Uuid) -> AppResult<Rental> {
        self.rental(rental_id).await
    }

    pub async fn admin_renter_history(&self, renter_id: Uuid) -> AppResult<Vec<Rental>> {
        self.account_exists(renter_id).await?;
        self.rentals.find_by_renter(renter_id).await
    }

    pub async fn admin_vehicle_history(&self, vehicle_id: Uuid) -> AppResult<Vec<Rental>> {
        self.vehicle(vehicle_id).await?;
        self.rentals.find_by_vehicle(vehicle_id).await
    }

    /// Crear un alquiler a mano con las mismas comprobaciones que `start`.
    /// Con hora de fin se crea ya cerrado y con precio, sin comprobar ni
    /// descontar saldo y sin tocar el vehículo.
    pub async fn admin_create(&self, request: AdminRental) -> AppResult<Rental> {
        let _locks = self.locks.acquire(&[request.vehicle_id, request.renter_id]).await;

        self.account_exists(request.renter_id).await?;
        let mut vehicle = self.vehicle(request.vehicle_id).await?;
        if !vehicle.can_be_rented {
            return Err(RentalError::NotRentable.into());
        }
        if vehicle.is_owned_by(request.renter_id) {
            return Err(RentalError::SelfRentForbidden.into());
        }
        if request.price_per_unit <= Decimal::ZERO {
            return Err(RentalError::RateNotOffered.into());
        }

        let mut rental = Rental::open(
            vehicle.id,
            request.renter_id,
            request.rate_unit,
            request.price_per_unit,
            request.started_at,
        );
        let mut changes = RentalChanges::new();
        match request.ended_at {
            Some(ended_at) => {
                let final_price =
                    pricing_service::price(rental.started_at, ended_at, rental.rate_unit, rental.price_per_unit)?;
                rental.close(ended_at, final_price)?;
            }
            None => {
                vehicle.can_be_rented = false;
                changes = changes.save_vehicle(vehicle);
            }
        }

        self.rentals
            .commit(changes.write_rental(RentalWrite::Insert(rental.clone())))
            .await?;

        info!("🛠️ Alquiler {} creado por administrador ({:?})", rental.id, rental.state());
        Ok(rental)
    }

    /// Terminar cualquier alquiler; mismas reglas de cobro que `end`
    pub async fn admin_end(&self, rental_id: Uuid, latitude: f64, longitude: f64) -> AppResult<Rental> {
        let (rental, _locks) = self.lock_rental(rental_id, &[]).await?;
        self.close(rental, latitude, longitude).await
    }

    /// Reemplazar los datos de un alquiler. El precio se recalcula si hay
    /// hora de fin; el saldo no se toca.
    pub async fn admin_update(&self, rental_id: Uuid, request: AdminRental) -> AppResult<Rental> {
        let (current, _locks) = self
            .lock_rental(rental_id, &[request.vehicle_id, request.renter_id])
            .await?;

        if !current.is_open() && request.ended_at.is_none() {
            return Err(RentalError::AlreadyClosed.into());
        }
        self.account_exists(request.renter_id).await?;
        let mut new_vehicle = self.vehicle(request.vehicle_id).await?;
        if new_vehicle.is_owned_by(request.renter_id) {
            return Err(RentalError::SelfRentForbidden.into());
        }
        if request.price_per_unit <= Decimal::ZERO {
            return Err(RentalError::RateNotOffered.into());
        }

        let closure = match request.ended_at {
            Some(ended_at) => Some(RentalClosure {
                ended_at,
                final_price: pricing_service::price(
                    request.started_at,
                    ended_at,
                    request.rate_unit,
                    request.price_per_unit,
                )?,
            }),
            None => None,
        };
        let updated = Rental {
            id: current.id,
            vehicle_id: request.vehicle_id,
            renter_id: request.renter_id,
            rate_unit: request.rate_unit,
            price_per_unit: request.price_per_unit,
            started_at: request.started_at,
            closure,
        };

        let mut changes = RentalChanges::new();
        let same_vehicle = current.vehicle_id == updated.vehicle_id;
        match (current.is_open(), updated.is_open()) {
            // Se cierra: el vehículo original vuelve a estar disponible
            (true, false) => {
                if let Some(mut old) = self.vehicles.find_by_id(current.vehicle_id).await? {
                    old.can_be_rented = true;
                    changes = changes.save_vehicle(old);
                }
            }
            // Sigue abierto en otro vehículo
            (true, true) if !same_vehicle => {
                if !new_vehicle.can_be_rented {
                    return Err(RentalError::NotRentable.into());
                }
                new_vehicle.can_be_rented = false;
                changes = changes.save_vehicle(new_vehicle);
                if let Some(mut old) = self.vehicles.find_by_id(current.vehicle_id).await? {
                    old.can_be_rented = true;
                    changes = changes.save_vehicle(old);
                }
            }
            _ => {}
        }

        self.rentals
            .commit(changes.write_rental(RentalWrite::Update(updated.clone())))
            .await?;

        info!("🛠️ Alquiler {} actualizado por administrador", updated.id);
        Ok(updated)
    }

    /// Borrar el registro. Si estaba abierto, el vehículo se libera en el
    /// mismo commit para que no quede bloqueado sin alquiler.
    pub async fn admin_delete(&self, rental_id: Uuid) -> AppResult<()> {
        let (rental, _locks) = self.lock_rental(rental_id, &[]).await?;

        let mut changes = RentalChanges::new().write_rental(RentalWrite::Delete(rental.id));
        if rental.is_open() {
            if let Some(mut vehicle) = self.vehicles.find_by_id(rental.vehicle_id).await? {
                vehicle.can_be_rented = true;
                changes = changes.save_vehicle(vehicle);
            }
            warn!("🗑️ Borrando alquiler abierto {}; vehículo {} liberado", rental.id, rental.vehicle_id);
        }

        self.rentals.commit(changes).await?;
        info!("🗑️ Alquiler {} eliminado", rental.id);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------

    async fn rental(&self, rental_id: Uuid) -> AppResult<Rental> {
        Ok(self
            .rentals
            .find_by_id(rental_id)
            .await?
            .ok_or(RentalError::RentalNotFound)?)
    }

    async fn vehicle(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        Ok(self
            .vehicles
            .find_by_id(vehicle_id)
            .await?
            .ok_or(RentalError::VehicleNotFound)?)
    }

    async fn account_exists(&self, account_id: Uuid) -> AppResult<()> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .ok_or(RentalError::AccountNotFound)?;
        Ok(())
    }

    /// Locks del alquiler, su vehículo, su arrendatario y `extra`, tomados de
    /// una vez. Devuelve el alquiler releído con los locks ya tomados.
    async fn lock_rental(&self, rental_id: Uuid, extra: &[Uuid]) -> AppResult<(Rental, LockSet)> {
        for _ in 0..LOCK_ATTEMPTS {
            let seen = self.rental(rental_id).await?;
            let mut ids = vec![rental_id, seen.vehicle_id, seen.renter_id];
            ids.extend_from_slice(extra);
            let locks = self.locks.acquire(&ids).await;

            let current = self.rental(rental_id).await?;
            if current.vehicle_id == seen.vehicle_id && current.renter_id == seen.renter_id {
                return Ok((current, locks));
            }
        }
        Err(AppError::Conflict(format!(
            "rental {} is being modified concurrently",
            rental_id
        )))
    }

    /// Cierre con cobro: precio, saldo, vehículo y alquiler en un solo commit
    async fn close(&self, mut rental: Rental, latitude: f64, longitude: f64) -> AppResult<Rental> {
        if !rental.is_open() {
            return Err(RentalError::AlreadyClosed.into());
        }
        if validate_coordinates(latitude, longitude).is_err() {
            return Err(validation_error(
                "coordinates",
                "latitude must be in [-90, 90] and longitude in [-180, 180]",
            ));
        }

        let ended_at = self.clock.now();
        let final_price =
            pricing_service::price(rental.started_at, ended_at, rental.rate_unit, rental.price_per_unit)?;

        let mut account = self
            .accounts
            .find_by_id(rental.renter_id)
            .await?
            .ok_or(RentalError::AccountNotFound)?;
        if final_price > account.balance {
            warn!(
                "💸 Saldo insuficiente para cerrar {}: precio {} > saldo {}",
                rental.id, final_price, account.balance
            );
            return Err(RentalError::InsufficientBalance.into());
        }
        let mut vehicle = self.vehicle(rental.vehicle_id).await?;

        account.balance -= final_price;
        vehicle.latitude = latitude;
        vehicle.longitude = longitude;
        vehicle.can_be_rented = true;
        rental.close(ended_at, final_price)?;

        self.rentals
            .commit(
                RentalChanges::new()
                    .save_account(account)
                    .save_vehicle(vehicle)
                    .write_rental(RentalWrite::Update(rental.clone())),
            )
            .await?;

        info!("🏁 Alquiler {} cerrado: precio final {}", rental.id, final_price);
        Ok(rental)
    }
}
