//! Servicio de autenticación
//!
//! Registro, login con JWT, logout por revocación del `jti` y alta del
//! administrador inicial.

use std::sync::Arc;

use bcrypt::{hash, verify};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::account::{Account, Role};
use crate::repositories::AccountLedger;
use crate::services::jwt_service::{JwtService, TokenIdentity};
use crate::services::token_revocation::TokenRevocation;
use crate::utils::clock::Clock;
use crate::utils::errors::{AppError, AppResult, RentalError};

#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountLedger>,
    jwt: JwtService,
    revocation: Arc<dyn TokenRevocation>,
    clock: Arc<dyn Clock>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountLedger>,
        jwt: JwtService,
        revocation: Arc<dyn TokenRevocation>,
        clock: Arc<dyn Clock>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            accounts,
            jwt,
            revocation,
            clock,
            bcrypt_cost,
        }
    }

    /// Registrar una cuenta de usuario con saldo cero
    pub async fn sign_up(&self, username: &str, password: &str) -> AppResult<Account> {
        let account = self.new_account(username, password, Role::User)?;
        self.accounts.create(&account).await?;
        info!("👤 Cuenta registrada: {} ({})", account.username, account.id);
        Ok(account)
    }

    /// Login: devuelve un token de acceso
    pub async fn sign_in(&self, username: &str, password: &str) -> AppResult<String> {
        let account = self
            .accounts
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Credenciales inválidas".to_string()))?;

        let valid = verify(password, &account.password_hash).map_err(|e| AppError::Hash(e.to_string()))?;
        if !valid {
            warn!("🔐 Login fallido para {}", username);
            return Err(AppError::Unauthorized("Credenciales inválidas".to_string()));
        }

        let token = self.jwt.generate_access_token(&account)?;
        info!("🔐 Login correcto: {}", account.username);
        Ok(token)
    }

    pub async fn sign_out(&self, identity: &TokenIdentity) {
        self.revocation.revoke(identity.token_id, identity.expires_at).await;
        info!("🚪 Sesión cerrada para {}", identity.account_id);
    }

    /// Valida un token, comprueba que no esté revocado y toma el rol
    /// actual de la cuenta (un administrador puede cambiarlo o borrarla)
    pub async fn authenticate(&self, token: &str) -> AppResult<TokenIdentity> {
        let mut identity = self.jwt.validate_token(token)?;
        if self.revocation.is_revoked(identity.token_id).await {
            return Err(AppError::Unauthorized("Token revocado".to_string()));
        }

        let account = self
            .accounts
            .find_by_id(identity.account_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("La cuenta ya no existe".to_string()))?;
        identity.role = account.role;
        Ok(identity)
    }

    pub async fn me(&self, account_id: Uuid) -> AppResult<Account> {
        Ok(self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(RentalError::AccountNotFound)?)
    }

    /// Crear el administrador inicial, o promover la cuenta si ya existe
    pub async fn ensure_admin(&self, username: &str, password: &str) -> AppResult<Account> {
        if let Some(mut existing) = self.accounts.find_by_username(username).await? {
            if !existing.is_admin() {
                existing.role = Role::Admin;
                self.accounts.save(&existing).await?;
                info!("🛡️ Cuenta {} promovida a administrador", username);
            }
            return Ok(existing);
        }

        let account = self.new_account(username, password, Role::Admin)?;
        self.accounts.create(&account).await?;
        info!("🛡️ Administrador inicial creado: {}", username);
        Ok(account)
    }

    fn new_account(&self, username: &str, password: &str, role: Role) -> AppResult<Account> {
        let password_hash = hash_password(password, self.bcrypt_cost)?;

        Ok(Account {
            id: Uuid::new_v4(),
            username: username.trim().to_string(),
            password_hash,
            role,
            balance: Decimal::ZERO,
            created_at: self.clock.now(),
        })
    }
}

pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    hash(password, cost).map_err(|e| AppError::Hash(e.to_string()))
}
