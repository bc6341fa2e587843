use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{BoundingBox, VehicleDirectory};
use crate::models::vehicle::{NewVehicle, Vehicle, VehicleType};
use crate::utils::errors::{AppError, AppResult};

// Fila tal cual está en la tabla vehicles
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct VehicleRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub vehicle_type: String,
    pub can_be_rented: bool,
    pub model: String,
    pub color: String,
    pub identifier: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub minute_price: Option<Decimal>,
    pub day_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = AppError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        Ok(Vehicle {
            id: row.id,
            owner_id: row.owner_id,
            vehicle_type: row.vehicle_type.parse::<VehicleType>()?,
            can_be_rented: row.can_be_rented,
            model: row.model,
            color: row.color,
            identifier: row.identifier,
            description: row.description,
            latitude: row.latitude,
            longitude: row.longitude,
            minute_price: row.minute_price,
            day_price: row.day_price,
            created_at: row.created_at,
        })
    }
}

/// Guardar la fila completa de un vehículo usando la conexión dada
pub(crate) async fn save_vehicle(conn: &mut PgConnection, vehicle: &Vehicle) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE vehicles
        SET owner_id = $2, vehicle_type = $3, can_be_rented = $4, model = $5, color = $6,
            identifier = $7, description = $8, latitude = $9, longitude = $10,
            minute_price = $11, day_price = $12
        WHERE id = $1
        "#,
    )
    .bind(vehicle.id)
    .bind(vehicle.owner_id)
    .bind(vehicle.vehicle_type.as_str())
    .bind(vehicle.can_be_rented)
    .bind(&vehicle.model)
    .bind(&vehicle.color)
    .bind(&vehicle.identifier)
    .bind(&vehicle.description)
    .bind(vehicle.latitude)
    .bind(vehicle.longitude)
    .bind(vehicle.minute_price)
    .bind(vehicle.day_price)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("vehicle {}", vehicle.id)));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleDirectory for PgVehicleRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Vehicle::try_from).transpose()
    }

    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> AppResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>(
            "SELECT * FROM vehicles WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Vehicle::try_from).transpose()
    }

    async fn find_rentable_within(
        &self,
        bounds: BoundingBox,
        vehicle_type: Option<VehicleType>,
    ) -> AppResult<Vec<Vehicle>> {
        let rows = sqlx::query_as::<_, VehicleRow>(
            r#"
            SELECT * FROM vehicles
            WHERE can_be_rented
              AND ($1::TEXT IS NULL OR vehicle_type = $1)
              AND latitude BETWEEN $2 AND $3
              AND longitude BETWEEN $4 AND $5
            "#,
        )
        .bind(vehicle_type.map(|t| t.as_str()))
        .bind(bounds.min_latitude)
        .bind(bounds.max_latitude)
        .bind(bounds.min_longitude)
        .bind(bounds.max_longitude)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Vehicle::try_from).collect()
    }

    async fn list(
        &self,
        offset: i64,
        limit: i64,
        vehicle_type: Option<VehicleType>,
    ) -> AppResult<Vec<Vehicle>> {
        let rows = sqlx::query_as::<_, VehicleRow>(
            r#"
            SELECT * FROM vehicles
            WHERE ($3::TEXT IS NULL OR vehicle_type = $3)
            ORDER BY created_at, id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .bind(vehicle_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Vehicle::try_from).collect()
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let rows = sqlx::query_as::<_, VehicleRow>(
            "SELECT * FROM vehicles WHERE owner_id = $1 ORDER BY created_at, id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Vehicle::try_from).collect()
    }

    async fn create(&self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            INSERT INTO vehicles (id, owner_id, vehicle_type, can_be_rented, model, color, identifier,
                                  description, latitude, longitude, minute_price, day_price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(vehicle.owner_id)
        .bind(vehicle.vehicle_type.as_str())
        .bind(vehicle.can_be_rented)
        .bind(vehicle.model)
        .bind(vehicle.color)
        .bind(vehicle.identifier)
        .bind(vehicle.description)
        .bind(vehicle.latitude)
        .bind(vehicle.longitude)
        .bind(vehicle.minute_price)
        .bind(vehicle.day_price)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Vehicle::try_from(row)
    }

    async fn save(&self, vehicle: &Vehicle) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        save_vehicle(&mut conn, vehicle).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
