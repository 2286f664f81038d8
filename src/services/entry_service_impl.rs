//! `SeaORM` implementation of the `EntryService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{
    AttachOutcome, CloseOutcome, EntryFilter, NewEntry, OpenOutcome, Store,
};
use crate::entities::{entry_photos, key_controls, vehicle_entries, vehicles, work_orders};
use crate::services::entry_service::{
    DashboardStats, EntryDetailInfo, EntryError, EntryInfo, EntryListQuery, EntryPage,
    EntryService, OpenEntryInput,
};

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

/// Whether an RFC 3339 timestamp falls on the given calendar day in the
/// deployment's local timezone. Day boundaries for the dashboard counters
/// follow the server clock, not UTC.
fn falls_on_local_day(timestamp: &str, day: chrono::NaiveDate) -> bool {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&chrono::Local).date_naive() == day)
        .unwrap_or(false)
}

pub struct SeaOrmEntryService {
    store: Store,
}

impl SeaOrmEntryService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn entry_info(entry: vehicle_entries::Model, vehicle: Option<&vehicles::Model>) -> EntryInfo {
        EntryInfo {
            id: entry.id,
            entry_code: entry.entry_code,
            vehicle_id: entry.vehicle_id,
            license_plate: vehicle.map(|v| v.license_plate.clone()),
            workshop_id: entry.workshop_id,
            driver_name: entry.driver_name,
            driver_rut: entry.driver_rut,
            entry_date: entry.entry_date,
            exit_date: entry.exit_date,
            status: entry.status,
        }
    }

    fn attach_error<T>(outcome: AttachOutcome<T>) -> Result<T, EntryError> {
        match outcome {
            AttachOutcome::Attached(value) => Ok(value),
            AttachOutcome::EntryNotFound => Err(EntryError::NotFound),
            AttachOutcome::EntryClosed => Err(EntryError::EntryClosed),
        }
    }
}

#[async_trait]
impl EntryService for SeaOrmEntryService {
    async fn open(
        &self,
        input: OpenEntryInput,
        created_by: i32,
    ) -> Result<EntryInfo, EntryError> {
        if input.driver_name.trim().is_empty() {
            return Err(EntryError::Validation(
                "Driver name must not be empty".to_string(),
            ));
        }

        let outcome = self
            .store
            .open_entry(NewEntry {
                vehicle_id: input.vehicle_id,
                workshop_id: input.workshop_id,
                driver_name: input.driver_name.trim().to_string(),
                driver_rut: input.driver_rut,
                created_by_id: created_by,
                key_location: input.key_location,
            })
            .await?;

        match outcome {
            OpenOutcome::Opened(entry) => {
                info!(entry_id = entry.id, entry_code = %entry.entry_code, "Entry opened");
                Ok(Self::entry_info(entry, None))
            }
            OpenOutcome::UnknownVehicle => Err(EntryError::UnknownVehicle),
            OpenOutcome::UnknownWorkshop => Err(EntryError::UnknownWorkshop),
            OpenOutcome::CodeExhausted => Err(EntryError::DuplicateEntryCode),
        }
    }

    async fn close(&self, entry_id: i32) -> Result<EntryInfo, EntryError> {
        match self.store.close_entry(entry_id).await? {
            CloseOutcome::Closed(entry) => {
                info!(entry_id = entry.id, entry_code = %entry.entry_code, "Entry closed");
                Ok(Self::entry_info(entry, None))
            }
            CloseOutcome::NotFound => Err(EntryError::NotFound),
            CloseOutcome::AlreadyClosed => Err(EntryError::AlreadyClosed),
        }
    }

    async fn add_work_order(
        &self,
        entry_id: i32,
        description: &str,
    ) -> Result<work_orders::Model, EntryError> {
        if description.trim().is_empty() {
            return Err(EntryError::Validation(
                "Work order description must not be empty".to_string(),
            ));
        }

        let outcome = self
            .store
            .attach_work_order(entry_id, description.trim())
            .await?;
        Self::attach_error(outcome)
    }

    async fn add_photo(
        &self,
        entry_id: i32,
        url: &str,
        description: Option<&str>,
    ) -> Result<entry_photos::Model, EntryError> {
        if url.trim().is_empty() {
            return Err(EntryError::Validation("Photo URL must not be empty".to_string()));
        }

        let outcome = self
            .store
            .attach_entry_photo(entry_id, url.trim(), description)
            .await?;
        Self::attach_error(outcome)
    }

    async fn set_key_control(
        &self,
        entry_id: i32,
        key_location: &str,
        delivered_to: Option<&str>,
    ) -> Result<key_controls::Model, EntryError> {
        if key_location.trim().is_empty() {
            return Err(EntryError::Validation(
                "Key location must not be empty".to_string(),
            ));
        }

        let outcome = self
            .store
            .set_key_control(entry_id, key_location.trim(), delivered_to)
            .await?;
        Self::attach_error(outcome)
    }

    async fn get_detail(&self, entry_id: i32) -> Result<EntryDetailInfo, EntryError> {
        let detail = self
            .store
            .get_entry_detail(entry_id)
            .await?
            .ok_or(EntryError::NotFound)?;

        Ok(EntryDetailInfo {
            entry: Self::entry_info(detail.entry, detail.vehicle.as_ref()),
            workshop_name: detail.workshop.map(|w| w.name),
            work_orders: detail.work_orders,
            photos: detail.photos,
            key_control: detail.key_control,
        })
    }

    async fn list(&self, query: &EntryListQuery) -> Result<EntryPage, EntryError> {
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(EntryError::Validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }

        if let Some(status) = &query.status {
            if status != "ingresado" && status != "salida" {
                return Err(EntryError::Validation(format!(
                    "Unknown status filter: {status}"
                )));
            }
        }

        let date_from = match query.date_from.as_deref().map(str::trim) {
            Some(raw) => {
                if chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_err()
                    && chrono::DateTime::parse_from_rfc3339(raw).is_err()
                {
                    return Err(EntryError::Validation(format!(
                        "Invalid date_from: {raw}. Expected YYYY-MM-DD or an RFC 3339 timestamp"
                    )));
                }
                Some(raw.to_string())
            }
            None => None,
        };

        let filter = EntryFilter {
            status: query.status.clone(),
            vehicle_id: query.vehicle_id,
            workshop_id: query.workshop_id,
            date_from,
            limit,
            offset: query.offset.unwrap_or(0),
        };

        let (rows, total) = self.store.list_entries(&filter).await?;

        let entries = rows
            .into_iter()
            .map(|(entry, vehicle)| Self::entry_info(entry, vehicle.as_ref()))
            .collect();

        Ok(EntryPage {
            entries,
            total,
            limit,
        })
    }

    async fn active(&self) -> Result<Vec<EntryInfo>, EntryError> {
        let rows = self.store.active_entries().await?;

        Ok(rows
            .into_iter()
            .map(|(entry, vehicle)| Self::entry_info(entry, vehicle.as_ref()))
            .collect())
    }

    async fn dashboard(&self) -> Result<DashboardStats, EntryError> {
        let rows = self.store.dashboard_rows().await?;

        let today = chrono::Local::now().date_naive();

        let mut stats = DashboardStats {
            vehicles_inside: 0,
            entries_today: 0,
            exits_today: 0,
            total_entries: rows.len() as u64,
        };

        for row in &rows {
            if row.status == "ingresado" {
                stats.vehicles_inside += 1;
            }
            if falls_on_local_day(&row.entry_date, today) {
                stats.entries_today += 1;
            }
            if row
                .exit_date
                .as_deref()
                .is_some_and(|d| falls_on_local_day(d, today))
            {
                stats.exits_today += 1;
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local, Utc};

    #[test]
    fn test_falls_on_local_day() {
        let today = Local::now().date_naive();

        // The same instant counts regardless of the offset it was stored with
        assert!(falls_on_local_day(&Local::now().to_rfc3339(), today));
        assert!(falls_on_local_day(&Utc::now().to_rfc3339(), today));

        let yesterday = (Local::now() - Duration::days(1)).to_rfc3339();
        assert!(!falls_on_local_day(&yesterday, today));

        assert!(!falls_on_local_day("not-a-timestamp", today));
        assert!(!falls_on_local_day("", today));
    }
}
