pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod scheduler;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
pub use config::Config;
use scheduler::Scheduler;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    // .env is optional; real deployments set the environment directly
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "daemon" | "-d" | "--daemon" => run_daemon(config, prometheus_handle).await,

        "audit" => {
            let purge = args.iter().any(|a| a == "--purge");
            let json = args.iter().any(|a| a == "--json");
            cmd_audit(config, purge, json).await
        }

        "init" | "--init" => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Fleetgate - Workshop Vehicle Entry Tracker");
    println!();
    println!("USAGE:");
    println!("  fleetgate <command>");
    println!();
    println!("COMMANDS:");
    println!("  daemon           Run the API server and background auditor");
    println!("  audit            Run one consistency audit pass (report only)");
    println!("  audit --purge    Audit and delete flagged entries with their records");
    println!("  audit --json     Print the audit report as JSON");
    println!("  init             Create a default config.toml");
    println!("  help             Show this message");
}

async fn run_daemon(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "Fleetgate v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let shared = Arc::new(SharedState::new(config.clone()).await?);

    let api_state = api::create_app_state(shared.clone(), prometheus_handle).await?;

    let scheduler = Scheduler::new(shared.clone(), config.scheduler.clone());

    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.start().await {
            error!("Scheduler error: {}", e);
        }
    });

    let server_handle: Option<tokio::task::JoinHandle<()>> = if config.server.enabled {
        let port = config.server.port;
        info!("Starting Web API on port {}", port);

        let app = api::router(api_state).await;
        let addr = format!("0.0.0.0:{}", port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        Some(tokio::spawn(async move {
            info!("Web server running at http://0.0.0.0:{}", port);
            if let Err(e) = axum::serve(listener, app).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler_handle.abort();
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Daemon stopped");

    Ok(())
}

/// One audit pass from the command line. Exits non-zero when a purge was
/// requested and one or more flagged entries could not be removed.
async fn cmd_audit(config: Config, purge: bool, json: bool) -> anyhow::Result<()> {
    let shared = SharedState::new(config).await?;

    let report = shared
        .audit_service
        .run(purge)
        .await
        .map_err(|e| anyhow::anyhow!("Audit failed: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        if purge && report.failed > 0 {
            anyhow::bail!("{} flagged entries could not be purged", report.failed);
        }
        return Ok(());
    }

    println!("Scanned entries:  {}", report.scanned);
    println!("Flagged entries:  {}", report.findings.len());
    if purge {
        println!("Purged:           {}", report.purged);
        println!("Failed to purge:  {}", report.failed);
    }
    println!("Tokens pruned:    {}", report.tokens_pruned);

    for finding in &report.findings {
        let status = finding
            .purge_error
            .as_deref()
            .map_or_else(String::new, |e| format!(" [purge failed: {e}]"));
        println!(
            "  #{} {} ({}): {}{}",
            finding.entry_id,
            finding.entry_code,
            finding.status,
            finding.reasons.join(", "),
            status
        );
    }

    if purge && report.failed > 0 {
        anyhow::bail!("{} flagged entries could not be purged", report.failed);
    }

    Ok(())
}
