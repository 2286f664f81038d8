//! `SeaORM` implementation of the `AuditService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::{Inconsistency, Store};
use crate::services::audit_service::{AuditError, AuditFinding, AuditReport, AuditService};

pub struct SeaOrmAuditService {
    store: Store,
}

impl SeaOrmAuditService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn reason_label(reason: &Inconsistency) -> &'static str {
    match reason {
        Inconsistency::MalformedCode => "malformed_code",
        Inconsistency::OpenWithExitDate => "open_with_exit_date",
        Inconsistency::ClosedWithoutExitDate => "closed_without_exit_date",
        Inconsistency::UnknownStatus => "unknown_status",
        Inconsistency::MissingWorkOrder => "missing_work_order",
        Inconsistency::MissingPhoto => "missing_photo",
        Inconsistency::MissingKeyControl => "missing_key_control",
    }
}

#[async_trait]
impl AuditService for SeaOrmAuditService {
    async fn run(&self, purge: bool) -> Result<AuditReport, AuditError> {
        let (scanned, raw_findings) = self.store.find_inconsistent_entries().await?;

        let tokens_pruned = self
            .store
            .prune_expired_refresh_tokens(&chrono::Utc::now().to_rfc3339())
            .await?;

        let mut findings = Vec::with_capacity(raw_findings.len());
        let mut purged = 0;
        let mut failed = 0;

        for raw in raw_findings {
            let mut finding = AuditFinding {
                entry_id: raw.entry.id,
                entry_code: raw.entry.entry_code.clone(),
                status: raw.entry.status.clone(),
                reasons: raw.reasons.iter().map(|r| reason_label(r).to_string()).collect(),
                purge_error: None,
            };

            if purge {
                match self.store.purge_entry(raw.entry.id).await {
                    Ok(deleted) => {
                        purged += 1;
                        info!(
                            entry_id = raw.entry.id,
                            entry_code = %raw.entry.entry_code,
                            rows = deleted,
                            "Purged inconsistent entry"
                        );
                    }
                    Err(err) => {
                        failed += 1;
                        warn!(
                            entry_id = raw.entry.id,
                            error = %err,
                            "Failed to purge inconsistent entry"
                        );
                        finding.purge_error = Some(err.to_string());
                    }
                }
            }

            findings.push(finding);
        }

        info!(
            scanned,
            flagged = findings.len(),
            purged,
            failed,
            tokens_pruned,
            "Audit pass complete"
        );

        Ok(AuditReport {
            scanned,
            findings,
            purged,
            failed,
            tokens_pruned,
        })
    }
}
