//! Domain service for the vehicle entry lifecycle.
//!
//! An entry is opened when a vehicle arrives (`ingresado`) and closed when
//! it leaves (`salida`). Work orders, photos and key custody hang off an
//! open entry; once the vehicle has left the entry is immutable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{entry_photos, key_controls, work_orders};

/// Errors specific to entry lifecycle operations.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("Vehicle not found")]
    UnknownVehicle,

    #[error("Workshop not found")]
    UnknownWorkshop,

    #[error("Could not allocate a unique entry code")]
    DuplicateEntryCode,

    #[error("Entry not found")]
    NotFound,

    #[error("Entry is already closed")]
    AlreadyClosed,

    #[error("Entry is closed and can no longer be modified")]
    EntryClosed,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for EntryError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for EntryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Input for opening an entry.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenEntryInput {
    pub vehicle_id: i32,
    pub workshop_id: i32,
    pub driver_name: String,
    pub driver_rut: Option<String>,
    /// When set, key custody is recorded together with the entry.
    pub key_location: Option<String>,
}

/// Entry DTO for list and detail responses.
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
    pub id: i32,
    pub entry_code: String,
    pub vehicle_id: i32,
    pub license_plate: Option<String>,
    pub workshop_id: i32,
    pub driver_name: String,
    pub driver_rut: Option<String>,
    pub entry_date: String,
    pub exit_date: Option<String>,
    pub status: String,
}

/// Full entry detail including attached records.
#[derive(Debug, Serialize)]
pub struct EntryDetailInfo {
    #[serde(flatten)]
    pub entry: EntryInfo,
    pub workshop_name: Option<String>,
    pub work_orders: Vec<work_orders::Model>,
    pub photos: Vec<entry_photos::Model>,
    pub key_control: Option<key_controls::Model>,
}

/// Listing filter; limits above the cap are rejected, not clamped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryListQuery {
    pub status: Option<String>,
    pub vehicle_id: Option<i32>,
    pub workshop_id: Option<i32>,
    /// Only entries whose `entry_date` is on or after this date
    /// (`YYYY-MM-DD` or a full RFC 3339 timestamp).
    pub date_from: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Paginated listing result.
#[derive(Debug, Serialize)]
pub struct EntryPage {
    pub entries: Vec<EntryInfo>,
    pub total: u64,
    pub limit: u64,
}

/// Counters for the dashboard, all computed from one snapshot.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DashboardStats {
    pub vehicles_inside: u64,
    pub entries_today: u64,
    pub exits_today: u64,
    pub total_entries: u64,
}

/// Domain service trait for the entry lifecycle.
#[async_trait::async_trait]
pub trait EntryService: Send + Sync {
    /// Opens an entry for an arriving vehicle.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError::UnknownVehicle`] / [`EntryError::UnknownWorkshop`]
    /// for bad references, [`EntryError::DuplicateEntryCode`] when no unique
    /// code could be allocated.
    async fn open(&self, input: OpenEntryInput, created_by: i32)
        -> Result<EntryInfo, EntryError>;

    /// Registers the vehicle exit. Of N concurrent calls exactly one
    /// succeeds; the rest get [`EntryError::AlreadyClosed`].
    async fn close(&self, entry_id: i32) -> Result<EntryInfo, EntryError>;

    /// Attaches a work order to an open entry.
    async fn add_work_order(
        &self,
        entry_id: i32,
        description: &str,
    ) -> Result<work_orders::Model, EntryError>;

    /// Attaches a photo to an open entry.
    async fn add_photo(
        &self,
        entry_id: i32,
        url: &str,
        description: Option<&str>,
    ) -> Result<entry_photos::Model, EntryError>;

    /// Records or updates key custody for an open entry.
    async fn set_key_control(
        &self,
        entry_id: i32,
        key_location: &str,
        delivered_to: Option<&str>,
    ) -> Result<key_controls::Model, EntryError>;

    /// Gets an entry with its attached records.
    async fn get_detail(&self, entry_id: i32) -> Result<EntryDetailInfo, EntryError>;

    /// Paginated listing, newest first.
    async fn list(&self, query: &EntryListQuery) -> Result<EntryPage, EntryError>;

    /// Entries whose vehicle is currently inside, oldest first.
    async fn active(&self) -> Result<Vec<EntryInfo>, EntryError>;

    /// Dashboard counters, consistent with each other.
    async fn dashboard(&self) -> Result<DashboardStats, EntryError>;
}
