use anyhow::{Context, Result};
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

use crate::entities::{
    entry_photos, key_controls, vehicle_entries, vehicles, work_orders, workshops,
};

/// How many times a colliding generated code is retried before giving up.
const CODE_RETRY_LIMIT: u32 = 5;

/// Generate an entry code of the form `ING-YYYYMMDD-XXXX` where the suffix
/// is a random four-digit number. Collisions are handled by the caller via
/// the unique index on `entry_code`.
fn generate_entry_code(now: &chrono::DateTime<chrono::Utc>) -> String {
    let suffix: u32 = rand::rng().random_range(0..10_000);
    format!("ING-{}-{suffix:04}", now.format("%Y%m%d"))
}

fn generate_order_number(now: &chrono::DateTime<chrono::Utc>) -> String {
    let suffix: u32 = rand::rng().random_range(0..10_000);
    format!("OT-{}-{suffix:04}", now.format("%Y%m%d"))
}

fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub vehicle_id: i32,
    pub workshop_id: i32,
    pub driver_name: String,
    pub driver_rut: Option<String>,
    pub created_by_id: i32,
    pub key_location: Option<String>,
}

#[derive(Debug)]
pub enum OpenOutcome {
    Opened(vehicle_entries::Model),
    UnknownVehicle,
    UnknownWorkshop,
    /// Every generated code collided with an existing row.
    CodeExhausted,
}

#[derive(Debug)]
pub enum CloseOutcome {
    Closed(vehicle_entries::Model),
    NotFound,
    AlreadyClosed,
}

/// Outcome of attaching a child record (work order, photo, key control).
#[derive(Debug)]
pub enum AttachOutcome<T> {
    Attached(T),
    EntryNotFound,
    EntryClosed,
}

#[derive(Debug, Default, Clone)]
pub struct EntryFilter {
    pub status: Option<String>,
    pub vehicle_id: Option<i32>,
    pub workshop_id: Option<i32>,
    /// Lower bound on `entry_date`, inclusive. RFC 3339 timestamps sort
    /// lexicographically, so a plain `YYYY-MM-DD` prefix works too.
    pub date_from: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug)]
pub struct EntryDetail {
    pub entry: vehicle_entries::Model,
    pub vehicle: Option<vehicles::Model>,
    pub workshop: Option<workshops::Model>,
    pub work_orders: Vec<work_orders::Model>,
    pub photos: Vec<entry_photos::Model>,
    pub key_control: Option<key_controls::Model>,
}

/// Minimal projection used to compute dashboard counters in one pass.
#[derive(Debug, FromQueryResult)]
pub struct DashboardRow {
    pub status: String,
    pub entry_date: String,
    pub exit_date: Option<String>,
}

pub struct EntryRepository {
    conn: DatabaseConnection,
}

impl EntryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Open an entry: validates the vehicle and workshop, inserts the entry
    /// row with a fresh code, flips the vehicle to `in_maintenance` and
    /// records key custody when a location was given. All of it in one
    /// transaction so a code collision rolls the whole attempt back.
    pub async fn open(&self, input: NewEntry) -> Result<OpenOutcome> {
        for _ in 0..CODE_RETRY_LIMIT {
            match self.try_open(&input).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) => {
                    let retryable = err
                        .downcast_ref::<sea_orm::DbErr>()
                        .is_some_and(is_unique_violation);
                    if !retryable {
                        return Err(err);
                    }
                }
            }
        }

        Ok(OpenOutcome::CodeExhausted)
    }

    async fn try_open(&self, input: &NewEntry) -> Result<OpenOutcome> {
        let txn = self.conn.begin().await.context("Failed to begin transaction")?;

        let Some(vehicle) = vehicles::Entity::find_by_id(input.vehicle_id)
            .one(&txn)
            .await
            .context("Failed to query vehicle")?
        else {
            return Ok(OpenOutcome::UnknownVehicle);
        };

        if workshops::Entity::find_by_id(input.workshop_id)
            .one(&txn)
            .await
            .context("Failed to query workshop")?
            .is_none()
        {
            return Ok(OpenOutcome::UnknownWorkshop);
        }

        let now = chrono::Utc::now();
        let now_str = now.to_rfc3339();

        let entry = vehicle_entries::ActiveModel {
            entry_code: Set(generate_entry_code(&now)),
            vehicle_id: Set(input.vehicle_id),
            workshop_id: Set(input.workshop_id),
            driver_name: Set(input.driver_name.clone()),
            driver_rut: Set(input.driver_rut.clone()),
            entry_date: Set(now_str.clone()),
            exit_date: Set(None),
            status: Set("ingresado".to_string()),
            created_by_id: Set(input.created_by_id),
            created_at: Set(now_str.clone()),
            ..Default::default()
        };
        let entry = entry.insert(&txn).await?;

        let mut vehicle: vehicles::ActiveModel = vehicle.into();
        vehicle.status = Set("in_maintenance".to_string());
        vehicle.update(&txn).await?;

        if let Some(location) = &input.key_location {
            let key = key_controls::ActiveModel {
                entry_id: Set(entry.id),
                key_location: Set(location.clone()),
                delivered_to: Set(None),
                created_at: Set(now_str.clone()),
                updated_at: Set(now_str),
                ..Default::default()
            };
            key.insert(&txn).await?;
        }

        txn.commit().await.context("Failed to commit transaction")?;

        Ok(OpenOutcome::Opened(entry))
    }

    /// Register the vehicle exit. The UPDATE is conditional on the entry
    /// still being open, so of N concurrent closes exactly one wins and
    /// the exit timestamp is written once.
    pub async fn close(&self, entry_id: i32) -> Result<CloseOutcome> {
        let txn = self.conn.begin().await.context("Failed to begin transaction")?;

        let now = chrono::Utc::now().to_rfc3339();

        let result = vehicle_entries::Entity::update_many()
            .col_expr(vehicle_entries::Column::Status, Expr::value("salida"))
            .col_expr(vehicle_entries::Column::ExitDate, Expr::value(now))
            .filter(vehicle_entries::Column::Id.eq(entry_id))
            .filter(vehicle_entries::Column::Status.eq("ingresado"))
            .exec(&txn)
            .await
            .context("Failed to update entry status")?;

        if result.rows_affected == 0 {
            // Either the row doesn't exist or it already left
            let exists = vehicle_entries::Entity::find_by_id(entry_id)
                .one(&txn)
                .await
                .context("Failed to query entry")?
                .is_some();
            return Ok(if exists {
                CloseOutcome::AlreadyClosed
            } else {
                CloseOutcome::NotFound
            });
        }

        let entry = vehicle_entries::Entity::find_by_id(entry_id)
            .one(&txn)
            .await
            .context("Failed to re-read entry")?
            .ok_or_else(|| anyhow::anyhow!("Entry {entry_id} vanished after update"))?;

        // Only flip the vehicle back when it has no other open entry
        let open_elsewhere = vehicle_entries::Entity::find()
            .filter(vehicle_entries::Column::VehicleId.eq(entry.vehicle_id))
            .filter(vehicle_entries::Column::Status.eq("ingresado"))
            .count(&txn)
            .await
            .context("Failed to count open entries")?;

        if open_elsewhere == 0 {
            if let Some(vehicle) = vehicles::Entity::find_by_id(entry.vehicle_id)
                .one(&txn)
                .await
                .context("Failed to query vehicle")?
            {
                let mut vehicle: vehicles::ActiveModel = vehicle.into();
                vehicle.status = Set("active".to_string());
                vehicle.update(&txn).await?;
            }
        }

        txn.commit().await.context("Failed to commit transaction")?;

        Ok(CloseOutcome::Closed(entry))
    }

    /// Open-status gate shared by the attach operations. Runs on the same
    /// transaction as the subsequent write so a concurrent close cannot
    /// slip between the check and the insert.
    async fn open_entry_or_outcome<T, C: sea_orm::ConnectionTrait>(
        conn: &C,
        entry_id: i32,
    ) -> Result<std::result::Result<vehicle_entries::Model, AttachOutcome<T>>> {
        let Some(entry) = vehicle_entries::Entity::find_by_id(entry_id)
            .one(conn)
            .await
            .context("Failed to query entry")?
        else {
            return Ok(Err(AttachOutcome::EntryNotFound));
        };

        if entry.status != "ingresado" {
            return Ok(Err(AttachOutcome::EntryClosed));
        }

        Ok(Ok(entry))
    }

    pub async fn attach_work_order(
        &self,
        entry_id: i32,
        description: &str,
    ) -> Result<AttachOutcome<work_orders::Model>> {
        let now = chrono::Utc::now();

        // One transaction per attempt; a colliding order number rolls the
        // attempt back and a fresh suffix is tried
        for _ in 0..CODE_RETRY_LIMIT {
            let txn = self.conn.begin().await.context("Failed to begin transaction")?;

            if let Err(outcome) = Self::open_entry_or_outcome(&txn, entry_id).await? {
                return Ok(outcome);
            }

            let order = work_orders::ActiveModel {
                entry_id: Set(entry_id),
                order_number: Set(generate_order_number(&now)),
                description: Set(description.to_string()),
                status: Set("pending".to_string()),
                created_at: Set(now.to_rfc3339()),
                ..Default::default()
            };

            match order.insert(&txn).await {
                Ok(model) => {
                    txn.commit().await.context("Failed to commit transaction")?;
                    return Ok(AttachOutcome::Attached(model));
                }
                Err(err) if is_unique_violation(&err) => {}
                Err(err) => return Err(err).context("Failed to insert work order"),
            }
        }

        anyhow::bail!("Could not generate a unique work order number")
    }

    pub async fn attach_photo(
        &self,
        entry_id: i32,
        url: &str,
        description: Option<&str>,
    ) -> Result<AttachOutcome<entry_photos::Model>> {
        let txn = self.conn.begin().await.context("Failed to begin transaction")?;

        if let Err(outcome) = Self::open_entry_or_outcome(&txn, entry_id).await? {
            return Ok(outcome);
        }

        let photo = entry_photos::ActiveModel {
            entry_id: Set(entry_id),
            url: Set(url.to_string()),
            description: Set(description.map(ToString::to_string)),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let photo = photo
            .insert(&txn)
            .await
            .context("Failed to insert entry photo")?;

        txn.commit().await.context("Failed to commit transaction")?;

        Ok(AttachOutcome::Attached(photo))
    }

    /// Record or update key custody for an open entry (one row per entry).
    pub async fn set_key_control(
        &self,
        entry_id: i32,
        key_location: &str,
        delivered_to: Option<&str>,
    ) -> Result<AttachOutcome<key_controls::Model>> {
        let txn = self.conn.begin().await.context("Failed to begin transaction")?;

        if let Err(outcome) = Self::open_entry_or_outcome(&txn, entry_id).await? {
            return Ok(outcome);
        }

        let now = chrono::Utc::now().to_rfc3339();

        let existing = key_controls::Entity::find()
            .filter(key_controls::Column::EntryId.eq(entry_id))
            .one(&txn)
            .await
            .context("Failed to query key control")?;

        let model = if let Some(existing) = existing {
            let mut active: key_controls::ActiveModel = existing.into();
            active.key_location = Set(key_location.to_string());
            active.delivered_to = Set(delivered_to.map(ToString::to_string));
            active.updated_at = Set(now);
            active.update(&txn).await?
        } else {
            let active = key_controls::ActiveModel {
                entry_id: Set(entry_id),
                key_location: Set(key_location.to_string()),
                delivered_to: Set(delivered_to.map(ToString::to_string)),
                created_at: Set(now.clone()),
                updated_at: Set(now),
                ..Default::default()
            };
            active.insert(&txn).await?
        };

        txn.commit().await.context("Failed to commit transaction")?;

        Ok(AttachOutcome::Attached(model))
    }

    pub async fn get_detail(&self, entry_id: i32) -> Result<Option<EntryDetail>> {
        let Some((entry, vehicle)) = vehicle_entries::Entity::find_by_id(entry_id)
            .find_also_related(vehicles::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query entry")?
        else {
            return Ok(None);
        };

        let workshop = workshops::Entity::find_by_id(entry.workshop_id)
            .one(&self.conn)
            .await
            .context("Failed to query workshop")?;

        let work_orders = work_orders::Entity::find()
            .filter(work_orders::Column::EntryId.eq(entry_id))
            .order_by_asc(work_orders::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query work orders")?;

        let photos = entry_photos::Entity::find()
            .filter(entry_photos::Column::EntryId.eq(entry_id))
            .order_by_asc(entry_photos::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query entry photos")?;

        let key_control = key_controls::Entity::find()
            .filter(key_controls::Column::EntryId.eq(entry_id))
            .one(&self.conn)
            .await
            .context("Failed to query key control")?;

        Ok(Some(EntryDetail {
            entry,
            vehicle,
            workshop,
            work_orders,
            photos,
            key_control,
        }))
    }

    /// Paginated listing, newest first, with the unpaginated total.
    pub async fn list(
        &self,
        filter: &EntryFilter,
    ) -> Result<(Vec<(vehicle_entries::Model, Option<vehicles::Model>)>, u64)> {
        let mut query = vehicle_entries::Entity::find();

        if let Some(status) = &filter.status {
            query = query.filter(vehicle_entries::Column::Status.eq(status));
        }
        if let Some(vehicle_id) = filter.vehicle_id {
            query = query.filter(vehicle_entries::Column::VehicleId.eq(vehicle_id));
        }
        if let Some(workshop_id) = filter.workshop_id {
            query = query.filter(vehicle_entries::Column::WorkshopId.eq(workshop_id));
        }
        if let Some(date_from) = &filter.date_from {
            query = query.filter(vehicle_entries::Column::EntryDate.gte(date_from.clone()));
        }

        let total = query.clone().count(&self.conn).await.context("Failed to count entries")?;

        let rows = query
            .find_also_related(vehicles::Entity)
            .order_by_desc(vehicle_entries::Column::EntryDate)
            .limit(filter.limit)
            .offset(filter.offset)
            .all(&self.conn)
            .await
            .context("Failed to list entries")?;

        Ok((rows, total))
    }

    /// Vehicles currently inside, oldest entry first.
    pub async fn active(
        &self,
    ) -> Result<Vec<(vehicle_entries::Model, Option<vehicles::Model>)>> {
        vehicle_entries::Entity::find()
            .filter(vehicle_entries::Column::Status.eq("ingresado"))
            .find_also_related(vehicles::Entity)
            .order_by_asc(vehicle_entries::Column::EntryDate)
            .all(&self.conn)
            .await
            .context("Failed to list active entries")
    }

    /// One projection query feeding every dashboard counter, so all counts
    /// describe the same instant.
    pub async fn dashboard_rows(&self) -> Result<Vec<DashboardRow>> {
        vehicle_entries::Entity::find()
            .select_only()
            .column(vehicle_entries::Column::Status)
            .column(vehicle_entries::Column::EntryDate)
            .column(vehicle_entries::Column::ExitDate)
            .into_model::<DashboardRow>()
            .all(&self.conn)
            .await
            .context("Failed to query dashboard rows")
    }
}
