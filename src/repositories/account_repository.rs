use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::AccountLedger;
use crate::models::account::{Account, Role};
use crate::utils::errors::{conflict_error, unique_violation_as_conflict, AppError, AppResult};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AccountRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .ok_or_else(|| AppError::Internal(format!("unknown role '{}' for account {}", row.role, row.id)))?;

        Ok(Account {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            role,
            balance: row.balance,
            created_at: row.created_at,
        })
    }
}

pub(crate) async fn save_account(conn: &mut PgConnection, account: &Account) -> AppResult<()> {
    let result = sqlx::query(
        "UPDATE accounts SET username = $2, password_hash = $3, role = $4, balance = $5 WHERE id = $1",
    )
    .bind(account.id)
    .bind(&account.username)
    .bind(&account.password_hash)
    .bind(account.role.as_str())
    .bind(account.balance)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        unique_violation_as_conflict(e, || {
            format!("Account with username '{}' already exists", account.username)
        })
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("account {}", account.id)));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountLedger for PgAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Account::try_from).transpose()
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts ORDER BY created_at, id OFFSET $1 LIMIT $2",
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Account::try_from).collect()
    }

    async fn create(&self, account: &Account) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, username, password_hash, role, balance, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.balance)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(conflict_error("Account", "username", &account.username));
        }
        Ok(())
    }

    async fn save(&self, account: &Account) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        save_account(&mut conn, account).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
