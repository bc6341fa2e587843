//! Recargas de saldo
//!
//! La recarga toma el lock de la cuenta, igual que el cierre de un alquiler,
//! así que nunca se pierde un cobro ni una recarga.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::models::account::{Account, Role};
use crate::repositories::AccountLedger;
use crate::utils::errors::{forbidden_error, AppResult, RentalError};
use crate::utils::locks::KeyedLocks;

#[derive(Clone)]
pub struct PaymentService {
    accounts: Arc<dyn AccountLedger>,
    locks: KeyedLocks,
    top_up_amount: Decimal,
}

impl PaymentService {
    pub fn new(accounts: Arc<dyn AccountLedger>, locks: KeyedLocks, top_up_amount: Decimal) -> Self {
        Self {
            accounts,
            locks,
            top_up_amount,
        }
    }

    /// Sumar la cantidad configurada al saldo. Un usuario solo recarga su
    /// propia cuenta; un administrador, cualquiera.
    pub async fn top_up(&self, caller_id: Uuid, caller_role: Role, account_id: Uuid) -> AppResult<Account> {
        if caller_role != Role::Admin && caller_id != account_id {
            return Err(forbidden_error("top up", "only your own account"));
        }

        let _lock = self.locks.acquire(&[account_id]).await;
        let mut account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(RentalError::AccountNotFound)?;

        account.balance += self.top_up_amount;
        self.accounts.save(&account).await?;

        info!("💰 Recarga de {} en {}: saldo {}", self.top_up_amount, account.id, account.balance);
        Ok(account)
    }
}
