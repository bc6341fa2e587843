//! Gestión de cuentas
//!
//! Cambio de credenciales propias y CRUD de cuentas para administradores.
//! Cada escritura toma el lock de la cuenta, el mismo que usan el cierre de
//! alquileres y la recarga de saldo, así que un cambio de saldo hecho a mano
//! nunca pisa un cobro.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::auth_dto::{AccountResponse, AdminAccountRequest, CredentialsRequest};
use crate::dto::{ApiResponse, PageQuery};
use crate::models::account::{Account, Role};
use crate::repositories::{AccountLedger, RentalRepository, VehicleDirectory};
use crate::services::auth_service::hash_password;
use crate::utils::clock::Clock;
use crate::utils::errors::{AppError, AppResult, RentalError};
use crate::utils::locks::KeyedLocks;

#[derive(Clone)]
pub struct AccountController {
    accounts: Arc<dyn AccountLedger>,
    vehicles: Arc<dyn VehicleDirectory>,
    rentals: Arc<dyn RentalRepository>,
    locks: KeyedLocks,
    clock: Arc<dyn Clock>,
    bcrypt_cost: u32,
}

impl AccountController {
    pub fn new(
        accounts: Arc<dyn AccountLedger>,
        vehicles: Arc<dyn VehicleDirectory>,
        rentals: Arc<dyn RentalRepository>,
        locks: KeyedLocks,
        clock: Arc<dyn Clock>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            accounts,
            vehicles,
            rentals,
            locks,
            clock,
            bcrypt_cost,
        }
    }

    /// Cambiar username y contraseña de la cuenta propia
    pub async fn update_own(
        &self,
        account_id: Uuid,
        request: CredentialsRequest,
    ) -> AppResult<ApiResponse<AccountResponse>> {
        request.validate()?;
        let password_hash = hash_password(&request.password, self.bcrypt_cost)?;

        let _lock = self.locks.acquire(&[account_id]).await;
        let mut account = self.account(account_id).await?;
        account.username = request.username.trim().to_string();
        account.password_hash = password_hash;
        self.accounts.save(&account).await?;

        info!("👤 Cuenta {} actualizada por su titular", account.id);
        Ok(ApiResponse::success_with_message(
            account.into(),
            "Cuenta actualizada exitosamente",
        ))
    }

    pub async fn list(&self, query: PageQuery) -> AppResult<Vec<AccountResponse>> {
        query.validate()?;
        let accounts = self.accounts.list(query.start, query.count).await?;
        Ok(accounts.into_iter().map(AccountResponse::from).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<AccountResponse> {
        Ok(self.account(id).await?.into())
    }

    pub async fn create(&self, request: AdminAccountRequest) -> AppResult<ApiResponse<AccountResponse>> {
        request.validate()?;
        let account = Account {
            id: Uuid::new_v4(),
            username: request.username.trim().to_string(),
            password_hash: hash_password(&request.password, self.bcrypt_cost)?,
            role: role(request.is_admin),
            balance: request.balance,
            created_at: self.clock.now(),
        };
        self.accounts.create(&account).await?;

        info!("🛡️ Cuenta {} creada por administrador ({})", account.username, account.role.as_str());
        Ok(ApiResponse::success_with_message(
            account.into(),
            "Cuenta creada exitosamente",
        ))
    }

    /// Reemplazar username, contraseña, rol y saldo
    pub async fn update(
        &self,
        id: Uuid,
        request: AdminAccountRequest,
    ) -> AppResult<ApiResponse<AccountResponse>> {
        request.validate()?;
        let password_hash = hash_password(&request.password, self.bcrypt_cost)?;

        let _lock = self.locks.acquire(&[id]).await;
        let mut account = self.account(id).await?;
        account.username = request.username.trim().to_string();
        account.password_hash = password_hash;
        account.role = role(request.is_admin);
        account.balance = request.balance;
        self.accounts.save(&account).await?;

        info!("🛡️ Cuenta {} actualizada por administrador", account.id);
        Ok(ApiResponse::success_with_message(
            account.into(),
            "Cuenta actualizada exitosamente",
        ))
    }

    /// Borrar una cuenta sin vehículos ni historial de alquileres
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let _lock = self.locks.acquire(&[id]).await;
        self.account(id).await?;

        if !self.vehicles.find_by_owner(id).await?.is_empty() {
            warn!("🗑️ Cuenta {} no borrada: tiene vehículos", id);
            return Err(AppError::Conflict(
                "La cuenta es propietaria de vehículos".to_string(),
            ));
        }
        if !self.rentals.find_by_renter(id).await?.is_empty() {
            warn!("🗑️ Cuenta {} no borrada: tiene alquileres", id);
            return Err(AppError::Conflict(
                "La cuenta tiene historial de alquileres".to_string(),
            ));
        }

        self.accounts.delete(id).await?;
        info!("🗑️ Cuenta {} eliminada", id);
        Ok(())
    }

    async fn account(&self, id: Uuid) -> AppResult<Account> {
        Ok(self
            .accounts
            .find_by_id(id)
            .await?
            .ok_or(RentalError::AccountNotFound)?)
    }
}

fn role(is_admin: bool) -> Role {
    if is_admin {
        Role::Admin
    } else {
        Role::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rental::{RateUnit, Rental};
    use crate::repositories::{InMemoryStore, RentalChanges, RentalWrite};
    use crate::utils::clock::SystemClock;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn controller(store: &InMemoryStore) -> AccountController {
        AccountController::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            KeyedLocks::new(),
            Arc::new(SystemClock),
            4,
        )
    }

    fn admin_request(username: &str, is_admin: bool, balance: i64) -> AdminAccountRequest {
        AdminAccountRequest {
            username: username.to_string(),
            password: "password-1".to_string(),
            is_admin,
            balance: Decimal::from(balance),
        }
    }

    #[tokio::test]
    async fn test_admin_account_crud() {
        let store = InMemoryStore::new();
        let accounts = controller(&store);

        let created = accounts
            .create(admin_request("heidi", false, 100))
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(created.role, "user");
        assert_eq!(created.balance, Decimal::from(100));

        let updated = accounts
            .update(created.id, admin_request("heidi2", true, -20))
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(updated.username, "heidi2");
        assert_eq!(updated.role, "admin");
        assert_eq!(updated.balance, Decimal::from(-20));

        accounts.delete(created.id).await.unwrap();
        assert!(matches!(
            accounts.get_by_id(created.id).await,
            Err(AppError::Rental(RentalError::AccountNotFound))
        ));
    }

    #[tokio::test]
    async fn test_list_pages_in_creation_order() {
        let store = InMemoryStore::new();
        let accounts = controller(&store);
        for name in ["ivan", "judy", "kate"] {
            accounts.create(admin_request(name, false, 0)).await.unwrap();
        }

        let all = accounts.list(PageQuery { start: 0, count: 10 }).await.unwrap();
        assert_eq!(all.len(), 3);
        let tail = accounts.list(PageQuery { start: 1, count: 1 }).await.unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].id, all[1].id);

        assert!(matches!(
            accounts.list(PageQuery { start: -1, count: 1 }).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_own_rejects_taken_username() {
        let store = InMemoryStore::new();
        let accounts = controller(&store);
        accounts.create(admin_request("leo", false, 0)).await.unwrap();
        let mia = accounts.create(admin_request("mia", false, 0)).await.unwrap().data.unwrap();

        let taken = CredentialsRequest {
            username: "leo".to_string(),
            password: "new-password".to_string(),
        };
        assert!(matches!(accounts.update_own(mia.id, taken).await, Err(AppError::Conflict(_))));

        let renamed = CredentialsRequest {
            username: "mia_new".to_string(),
            password: "new-password".to_string(),
        };
        let updated = accounts.update_own(mia.id, renamed).await.unwrap().data.unwrap();
        assert_eq!(updated.username, "mia_new");
        let stored = AccountLedger::find_by_id(&store, mia.id).await.unwrap().unwrap();
        assert!(bcrypt::verify("new-password", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_delete_refuses_accounts_in_use() {
        let store = InMemoryStore::new();
        let accounts = controller(&store);
        let renter = accounts.create(admin_request("nick", false, 0)).await.unwrap().data.unwrap();

        let rental = Rental::open(Uuid::new_v4(), renter.id, RateUnit::Days, Decimal::ONE, Utc::now());
        let ended_at = rental.started_at + chrono::Duration::days(1);
        let mut closed = rental;
        closed.close(ended_at, Decimal::ONE).unwrap();
        store
            .commit(RentalChanges::new().write_rental(RentalWrite::Insert(closed)))
            .await
            .unwrap();

        assert!(matches!(accounts.delete(renter.id).await, Err(AppError::Conflict(_))));
        assert!(accounts.get_by_id(renter.id).await.is_ok());
    }
}
