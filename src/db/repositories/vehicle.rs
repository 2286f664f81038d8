use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set, SqlErr};

use crate::entities::{regions, vehicles, workshops};

/// Outcome of a vehicle registration attempt.
#[derive(Debug, Clone)]
pub enum CreateVehicleOutcome {
    Created(vehicles::Model),
    DuplicatePlate,
    UnknownRegion,
}

pub struct VehicleRepository {
    conn: DatabaseConnection,
}

impl VehicleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        license_plate: &str,
        brand: &str,
        model: &str,
        region_id: i32,
    ) -> Result<CreateVehicleOutcome> {
        if regions::Entity::find_by_id(region_id)
            .one(&self.conn)
            .await
            .context("Failed to query region")?
            .is_none()
        {
            return Ok(CreateVehicleOutcome::UnknownRegion);
        }

        let active = vehicles::ActiveModel {
            license_plate: Set(license_plate.to_string()),
            brand: Set(brand.to_string()),
            model: Set(model.to_string()),
            region_id: Set(region_id),
            status: Set("active".to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(CreateVehicleOutcome::Created(model)),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(CreateVehicleOutcome::DuplicatePlate)
            }
            Err(err) => Err(err).context("Failed to insert vehicle"),
        }
    }

    pub async fn get(&self, id: i32) -> Result<Option<vehicles::Model>> {
        vehicles::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query vehicle")
    }

    pub async fn list(&self) -> Result<Vec<(vehicles::Model, Option<regions::Model>)>> {
        vehicles::Entity::find()
            .find_also_related(regions::Entity)
            .order_by_asc(vehicles::Column::LicensePlate)
            .all(&self.conn)
            .await
            .context("Failed to list vehicles")
    }

    pub async fn list_regions(&self) -> Result<Vec<regions::Model>> {
        regions::Entity::find()
            .order_by_asc(regions::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list regions")
    }

    pub async fn list_workshops(&self) -> Result<Vec<workshops::Model>> {
        workshops::Entity::find()
            .order_by_asc(workshops::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list workshops")
    }
}
