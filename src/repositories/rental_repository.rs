use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::account_repository::save_account;
use super::vehicle_repository::save_vehicle;
use super::{RentalChanges, RentalRepository, RentalWrite};
use crate::models::rental::{RateUnit, Rental, RentalClosure};
use crate::utils::errors::{unique_violation_as_conflict, AppError, AppResult};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RentalRow {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub renter_id: Uuid,
    pub rate_unit: String,
    pub price_per_unit: Decimal,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub final_price: Option<Decimal>,
}

impl TryFrom<RentalRow> for Rental {
    type Error = AppError;

    fn try_from(row: RentalRow) -> Result<Self, Self::Error> {
        let closure = match (row.ended_at, row.final_price) {
            (Some(ended_at), Some(final_price)) => Some(RentalClosure { ended_at, final_price }),
            (None, None) => None,
            _ => {
                return Err(AppError::Internal(format!(
                    "rental {} has an end time without a final price (or the reverse)",
                    row.id
                )))
            }
        };

        Ok(Rental {
            id: row.id,
            vehicle_id: row.vehicle_id,
            renter_id: row.renter_id,
            rate_unit: row.rate_unit.parse::<RateUnit>()?,
            price_per_unit: row.price_per_unit,
            started_at: row.started_at,
            closure,
        })
    }
}

// El índice parcial solo admite un alquiler abierto por vehículo
fn open_rental_conflict(error: sqlx::Error, rental: &Rental) -> AppError {
    unique_violation_as_conflict(error, || {
        format!("vehicle {} already has an open rental", rental.vehicle_id)
    })
}

async fn insert_rental(conn: &mut PgConnection, rental: &Rental) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO rentals (id, vehicle_id, renter_id, rate_unit, price_per_unit, started_at, ended_at, final_price)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(rental.id)
    .bind(rental.vehicle_id)
    .bind(rental.renter_id)
    .bind(rental.rate_unit.as_str())
    .bind(rental.price_per_unit)
    .bind(rental.started_at)
    .bind(rental.ended_at())
    .bind(rental.final_price())
    .execute(&mut *conn)
    .await
    .map_err(|e| open_rental_conflict(e, rental))?;

    Ok(())
}

async fn update_rental(conn: &mut PgConnection, rental: &Rental) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE rentals
        SET vehicle_id = $2, renter_id = $3, rate_unit = $4, price_per_unit = $5,
            started_at = $6, ended_at = $7, final_price = $8
        WHERE id = $1
        "#,
    )
    .bind(rental.id)
    .bind(rental.vehicle_id)
    .bind(rental.renter_id)
    .bind(rental.rate_unit.as_str())
    .bind(rental.price_per_unit)
    .bind(rental.started_at)
    .bind(rental.ended_at())
    .bind(rental.final_price())
    .execute(&mut *conn)
    .await
    .map_err(|e| open_rental_conflict(e, rental))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("rental {}", rental.id)));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PgRentalRepository {
    pool: PgPool,
}

impl PgRentalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RentalRepository for PgRentalRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Rental>> {
        let row = sqlx::query_as::<_, RentalRow>("SELECT * FROM rentals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Rental::try_from).transpose()
    }

    async fn find_by_renter(&self, renter_id: Uuid) -> AppResult<Vec<Rental>> {
        let rows = sqlx::query_as::<_, RentalRow>(
            "SELECT * FROM rentals WHERE renter_id = $1 ORDER BY started_at DESC",
        )
        .bind(renter_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Rental::try_from).collect()
    }

    async fn find_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<Rental>> {
        let rows = sqlx::query_as::<_, RentalRow>(
            "SELECT * FROM rentals WHERE vehicle_id = $1 ORDER BY started_at DESC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Rental::try_from).collect()
    }

    async fn find_open_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Option<Rental>> {
        let row = sqlx::query_as::<_, RentalRow>(
            "SELECT * FROM rentals WHERE vehicle_id = $1 AND ended_at IS NULL",
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Rental::try_from).transpose()
    }

    async fn commit(&self, changes: RentalChanges) -> AppResult<()> {
        // Si algo falla, `tx` se descarta sin commit y PostgreSQL hace rollback
        let mut tx = self.pool.begin().await?;

        for vehicle in &changes.vehicles {
            save_vehicle(&mut tx, vehicle).await?;
        }
        for account in &changes.accounts {
            save_account(&mut tx, account).await?;
        }
        match &changes.rental {
            Some(RentalWrite::Insert(rental)) => insert_rental(&mut tx, rental).await?,
            Some(RentalWrite::Update(rental)) => update_rental(&mut tx, rental).await?,
            Some(RentalWrite::Delete(id)) => {
                sqlx::query("DELETE FROM rentals WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            None => {}
        }

        tx.commit().await?;
        debug!(
            "💾 Commit aplicado: {} vehículos, {} cuentas, alquiler: {}",
            changes.vehicles.len(),
            changes.accounts.len(),
            changes.rental.is_some()
        );
        Ok(())
    }
}
