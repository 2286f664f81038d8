//! Background scheduler for the periodic consistency audit.
//!
//! Scheduled sweeps are report-only: flagged entries are logged but never
//! purged automatically. Purging is an explicit operator action via the
//! `audit --purge` command.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::config::SchedulerConfig;
use crate::state::SharedState;

pub struct Scheduler {
    state: Arc<SharedState>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    pub fn new(state: Arc<SharedState>, config: SchedulerConfig) -> Self {
        Self {
            state,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let state = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let state = Arc::clone(&state);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                if let Err(e) = run_audit_sweep(&state).await {
                    error!("Scheduled audit sweep failed: {}", e);
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let interval_mins = self.config.audit_interval_minutes;

        info!("Scheduler running every {} minutes", interval_mins);

        let mut audit_interval = interval(Duration::from_secs(u64::from(interval_mins) * 60));

        // The first tick fires immediately; skip it so the sweep does not
        // race service startup
        audit_interval.tick().await;

        loop {
            audit_interval.tick().await;
            if !*self.running.read().await {
                break;
            }
            if let Err(e) = run_audit_sweep(&self.state).await {
                error!("Scheduled audit sweep failed: {}", e);
            }
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    pub async fn run_once(&self) -> Result<()> {
        info!("Running manual audit sweep...");
        run_audit_sweep(&self.state).await
    }
}

async fn run_audit_sweep(state: &SharedState) -> Result<()> {
    let report = state
        .audit_service
        .run(false)
        .await
        .map_err(|e| anyhow::anyhow!("Audit sweep failed: {e}"))?;

    if report.findings.is_empty() {
        info!(scanned = report.scanned, "Audit sweep found no inconsistencies");
    } else {
        for finding in &report.findings {
            warn!(
                entry_id = finding.entry_id,
                entry_code = %finding.entry_code,
                reasons = ?finding.reasons,
                "Inconsistent entry detected"
            );
        }
        warn!(
            scanned = report.scanned,
            flagged = report.findings.len(),
            "Audit sweep flagged entries; run `audit --purge` to remove them"
        );
    }

    Ok(())
}
