use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{AdminVehicleQuery, AdminVehicleRequest, VehicleRequest, VehicleResponse};
use crate::dto::ApiResponse;
use crate::models::vehicle::{NewVehicle, Vehicle};
use crate::repositories::{AccountLedger, RentalRepository, VehicleDirectory};
use crate::services::geo_search_service::VehicleTypeFilter;
use crate::utils::errors::{AppError, AppResult, RentalError};
use crate::utils::locks::KeyedLocks;

/// CRUD de vehículos para sus propietarios y para administradores
#[derive(Clone)]
pub struct VehicleController {
    vehicles: Arc<dyn VehicleDirectory>,
    accounts: Arc<dyn AccountLedger>,
    rentals: Arc<dyn RentalRepository>,
    locks: KeyedLocks,
}

impl VehicleController {
    pub fn new(
        vehicles: Arc<dyn VehicleDirectory>,
        accounts: Arc<dyn AccountLedger>,
        rentals: Arc<dyn RentalRepository>,
        locks: KeyedLocks,
    ) -> Self {
        Self {
            vehicles,
            accounts,
            rentals,
            locks,
        }
    }

    pub async fn create(&self, owner_id: Uuid, request: VehicleRequest) -> AppResult<ApiResponse<VehicleResponse>> {
        let vehicle = self.insert(request.into_new_vehicle(owner_id)?).await?;

        info!("🚗 Vehículo {} registrado por {}", vehicle.id, owner_id);
        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(vehicle),
            "Vehículo creado exitosamente",
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<VehicleResponse> {
        let vehicle = self
            .vehicles
            .find_by_id(id)
            .await?
            .ok_or(RentalError::VehicleNotFound)?;

        Ok(VehicleResponse::from(vehicle))
    }

    /// Reemplazar los datos del vehículo. Mientras haya un alquiler abierto
    /// no se puede volver a marcar como alquilable.
    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        request: VehicleRequest,
    ) -> AppResult<ApiResponse<VehicleResponse>> {
        let data = request.into_new_vehicle(owner_id)?;

        let _lock = self.locks.acquire(&[id, owner_id]).await;
        let current = self
            .vehicles
            .find_owned(owner_id, id)
            .await?
            .ok_or(RentalError::VehicleNotFound)?;
        let vehicle = self.replace(current, data).await?;

        info!("🚗 Vehículo {} actualizado", vehicle.id);
        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(vehicle),
            "Vehículo actualizado exitosamente",
        ))
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> AppResult<()> {
        let _lock = self.locks.acquire(&[id]).await;
        self.vehicles
            .find_owned(owner_id, id)
            .await?
            .ok_or(RentalError::VehicleNotFound)?;
        self.remove(id).await
    }

    /// Catálogo completo paginado, alquilable o no
    pub async fn admin_list(&self, query: AdminVehicleQuery) -> AppResult<Vec<VehicleResponse>> {
        query.validate()?;
        let filter: VehicleTypeFilter = query.vehicle_type.parse()?;
        let vehicles = self
            .vehicles
            .list(query.start, query.count, filter.as_type())
            .await?;

        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }

    pub async fn admin_create(&self, request: AdminVehicleRequest) -> AppResult<ApiResponse<VehicleResponse>> {
        let vehicle = self.insert(request.into_new_vehicle()?).await?;

        info!("🛡️ Vehículo {} registrado por administrador para {}", vehicle.id, vehicle.owner_id);
        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(vehicle),
            "Vehículo creado exitosamente",
        ))
    }

    /// Reemplazo completo, propietario incluido, con las mismas reglas que
    /// la edición del propietario
    pub async fn admin_update(
        &self,
        id: Uuid,
        request: AdminVehicleRequest,
    ) -> AppResult<ApiResponse<VehicleResponse>> {
        let data = request.into_new_vehicle()?;

        let _lock = self.locks.acquire(&[id, data.owner_id]).await;
        let current = self
            .vehicles
            .find_by_id(id)
            .await?
            .ok_or(RentalError::VehicleNotFound)?;
        self.owner_exists(data.owner_id).await?;
        let vehicle = self.replace(current, data).await?;

        info!("🛡️ Vehículo {} actualizado por administrador", vehicle.id);
        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(vehicle),
            "Vehículo actualizado exitosamente",
        ))
    }

    pub async fn admin_delete(&self, id: Uuid) -> AppResult<()> {
        let _lock = self.locks.acquire(&[id]).await;
        self.vehicles
            .find_by_id(id)
            .await?
            .ok_or(RentalError::VehicleNotFound)?;
        self.remove(id).await
    }

    async fn insert(&self, data: NewVehicle) -> AppResult<Vehicle> {
        // El lock del propietario impide darlo de alta mientras se borra su cuenta
        let _lock = self.locks.acquire(&[data.owner_id]).await;
        self.owner_exists(data.owner_id).await?;
        self.vehicles.create(data).await
    }

    async fn replace(&self, current: Vehicle, data: NewVehicle) -> AppResult<Vehicle> {
        if let Some(open) = self.rentals.find_open_by_vehicle(current.id).await? {
            if data.can_be_rented {
                return Err(AppError::Conflict(
                    "El vehículo tiene un alquiler abierto".to_string(),
                ));
            }
            if open.renter_id == data.owner_id {
                return Err(RentalError::SelfRentForbidden.into());
            }
        }

        let vehicle = data.into_vehicle(current.id, current.created_at);
        self.vehicles.save(&vehicle).await?;
        Ok(vehicle)
    }

    async fn remove(&self, id: Uuid) -> AppResult<()> {
        if self.rentals.find_open_by_vehicle(id).await?.is_some() {
            return Err(AppError::Conflict(
                "No se puede eliminar un vehículo con un alquiler abierto".to_string(),
            ));
        }

        self.vehicles.delete(id).await?;
        info!("🗑️ Vehículo {} eliminado", id);
        Ok(())
    }

    async fn owner_exists(&self, owner_id: Uuid) -> AppResult<()> {
        self.accounts
            .find_by_id(owner_id)
            .await?
            .ok_or(RentalError::AccountNotFound)?;
        Ok(())
    }
}
