//! Domain service for the consistency auditor.
//!
//! Scans vehicle entries for rows that violate the lifecycle invariants
//! (malformed codes, status/exit-date mismatches, open entries missing
//! their work order, photo or key control) and optionally purges them
//! together with their attached records.

use serde::Serialize;
use thiserror::Error;

/// Errors specific to audit operations.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuditError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuditError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// One flagged entry in an audit report.
#[derive(Debug, Clone, Serialize)]
pub struct AuditFinding {
    pub entry_id: i32,
    pub entry_code: String,
    pub status: String,
    pub reasons: Vec<String>,
    /// Set when a purge of this entry was attempted and failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purge_error: Option<String>,
}

/// Outcome of one audit run.
#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub scanned: u64,
    pub findings: Vec<AuditFinding>,
    pub purged: u64,
    pub failed: u64,
    /// Expired refresh tokens removed as part of the sweep.
    pub tokens_pruned: u64,
}

impl AuditReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.failed == 0
    }
}

/// Domain service trait for the auditor.
#[async_trait::async_trait]
pub trait AuditService: Send + Sync {
    /// Runs one audit pass. With `purge` set, flagged entries are deleted
    /// along with their photos, key control and work orders; a failure to
    /// purge one entry does not stop the rest.
    async fn run(&self, purge: bool) -> Result<AuditReport, AuditError>;
}
