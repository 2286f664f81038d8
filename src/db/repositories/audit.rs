use anyhow::{Context, Result};
use regex::Regex;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
};
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::entities::{entry_photos, key_controls, vehicle_entries, work_orders};

fn entry_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ING-\d{8}-\d{4}$").expect("Invalid regex"))
}

/// Why an entry was flagged by the auditor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// `entry_code` does not match `ING-YYYYMMDD-XXXX`.
    MalformedCode,
    /// Open entry that already carries an exit timestamp.
    OpenWithExitDate,
    /// Closed entry with no exit timestamp.
    ClosedWithoutExitDate,
    /// Status outside the `ingresado` / `salida` vocabulary.
    UnknownStatus,
    /// Open entry with no work order.
    MissingWorkOrder,
    /// Open entry with no photo.
    MissingPhoto,
    /// Open entry with no key-control record.
    MissingKeyControl,
}

#[derive(Debug)]
pub struct Finding {
    pub entry: vehicle_entries::Model,
    pub reasons: Vec<Inconsistency>,
}

pub struct AuditRepository {
    conn: DatabaseConnection,
}

impl AuditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Entry ids that have at least one row in the given child table.
    async fn entry_ids_with_children<E, C>(&self, column: C) -> Result<HashSet<i32>>
    where
        E: EntityTrait,
        C: ColumnTrait,
    {
        let ids: Vec<i32> = E::find()
            .select_only()
            .column(column)
            .distinct()
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to load child entry ids")?;
        Ok(ids.into_iter().collect())
    }

    /// Scan every entry and report the ones violating the lifecycle
    /// invariants: malformed codes, status/exit-date mismatches, and open
    /// entries missing any of their expected attachments. Returns
    /// `(scanned, findings)`.
    pub async fn find_inconsistent(&self) -> Result<(u64, Vec<Finding>)> {
        let entries = vehicle_entries::Entity::find()
            .all(&self.conn)
            .await
            .context("Failed to scan entries")?;

        let with_work_orders = self
            .entry_ids_with_children::<work_orders::Entity, _>(work_orders::Column::EntryId)
            .await?;
        let with_photos = self
            .entry_ids_with_children::<entry_photos::Entity, _>(entry_photos::Column::EntryId)
            .await?;
        let with_key_controls = self
            .entry_ids_with_children::<key_controls::Entity, _>(key_controls::Column::EntryId)
            .await?;

        let scanned = entries.len() as u64;
        let mut findings = Vec::new();

        for entry in entries {
            let mut reasons = Vec::new();

            if !entry_code_regex().is_match(&entry.entry_code) {
                reasons.push(Inconsistency::MalformedCode);
            }

            match entry.status.as_str() {
                "ingresado" if entry.exit_date.is_some() => {
                    reasons.push(Inconsistency::OpenWithExitDate);
                }
                "salida" if entry.exit_date.is_none() => {
                    reasons.push(Inconsistency::ClosedWithoutExitDate);
                }
                "ingresado" | "salida" => {}
                _ => reasons.push(Inconsistency::UnknownStatus),
            }

            // Completeness applies to open entries only
            if entry.status == "ingresado" && entry.exit_date.is_none() {
                if !with_work_orders.contains(&entry.id) {
                    reasons.push(Inconsistency::MissingWorkOrder);
                }
                if !with_photos.contains(&entry.id) {
                    reasons.push(Inconsistency::MissingPhoto);
                }
                if !with_key_controls.contains(&entry.id) {
                    reasons.push(Inconsistency::MissingKeyControl);
                }
            }

            if !reasons.is_empty() {
                findings.push(Finding { entry, reasons });
            }
        }

        Ok((scanned, findings))
    }

    /// Remove an entry together with its photos, key control and work
    /// orders. One transaction: either every row goes or none does.
    pub async fn purge(&self, entry_id: i32) -> Result<u64> {
        let txn = self.conn.begin().await.context("Failed to begin transaction")?;

        let mut deleted = 0;

        deleted += entry_photos::Entity::delete_many()
            .filter(entry_photos::Column::EntryId.eq(entry_id))
            .exec(&txn)
            .await
            .context("Failed to delete entry photos")?
            .rows_affected;

        deleted += key_controls::Entity::delete_many()
            .filter(key_controls::Column::EntryId.eq(entry_id))
            .exec(&txn)
            .await
            .context("Failed to delete key control")?
            .rows_affected;

        deleted += work_orders::Entity::delete_many()
            .filter(work_orders::Column::EntryId.eq(entry_id))
            .exec(&txn)
            .await
            .context("Failed to delete work orders")?
            .rows_affected;

        deleted += vehicle_entries::Entity::delete_many()
            .filter(vehicle_entries::Column::Id.eq(entry_id))
            .exec(&txn)
            .await
            .context("Failed to delete entry")?
            .rows_affected;

        txn.commit().await.context("Failed to commit transaction")?;

        Ok(deleted)
    }
}
