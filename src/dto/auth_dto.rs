use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::account::Account;
use crate::utils::validation::validate_not_blank;

// Sign-up y sign-in usan el mismo cuerpo
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 3, max = 64), custom = "validate_not_blank")]
    pub username: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

// Alta o reemplazo de una cuenta por un administrador
#[derive(Debug, Deserialize, Validate)]
pub struct AdminAccountRequest {
    #[validate(length(min = 3, max = 64), custom = "validate_not_blank")]
    pub username: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(token: String) -> Self {
        Self {
            token,
            token_type: "Bearer",
        }
    }
}

// Response de cuenta (sin password)
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub username: String,
    pub role: &'static str,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            role: account.role.as_str(),
            balance: account.balance,
            created_at: account.created_at,
        }
    }
}
