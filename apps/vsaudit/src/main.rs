//! vsaudit - storage auditor for virtualization clusters
//!
//! CLI front end for the audit engine: loads configuration, wires an
//! inventory provider, runs the audit pass while rendering progress
//! events, and prints the report as a table or JSON.

mod cli;
mod display;
mod error;
mod events;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::{OutputRenderer, ReportScope};
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use std::process;
use tokio::select;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vsaudit_config::Config;
use vsaudit_engine::run_audit;
use vsaudit_errors::Error;
use vsaudit_events::EventReceiver;
use vsaudit_providers::OfflineInventory;
use vsaudit_types::{AuditReport, CancellationFlag};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing();

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting vsaudit v{}", env!("CARGO_PKG_VERSION"));

    // Configuration precedence: file (or defaults), then environment,
    // then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global)?;

    let dump_path = cli.global.dump.as_deref().ok_or_else(|| {
        CliError::InvalidArguments("an inventory dump is required (--dump <PATH>)".to_string())
    })?;
    let provider = OfflineInventory::load(dump_path).await?;

    // Cooperative cancellation on Ctrl-C, honored at the engine's
    // per-object checkpoints
    let cancel = CancellationFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_flag.cancel();
        }
    });

    let (event_sender, event_receiver) = vsaudit_events::channel();
    let mut event_handler = EventHandler::new(cli.global.verbose, cli.global.json);

    let report = execute_with_events(
        run_audit(&provider, &provider, &config, &event_sender, &cancel),
        event_receiver,
        &mut event_handler,
    )
    .await?;

    let (scope, age_warning_days) = match cli.command {
        Commands::Audit => (ReportScope::Full, config.snapshots.age_warning_days),
        Commands::Orphans => (ReportScope::Orphans, config.snapshots.age_warning_days),
        Commands::Snapshots { age_warning } => (
            ReportScope::Snapshots,
            age_warning.unwrap_or(config.snapshots.age_warning_days),
        ),
    };

    let renderer = OutputRenderer::new(cli.global.json, age_warning_days);
    renderer.render(&report, scope)?;

    info!("Command completed successfully");
    Ok(())
}

/// Drive the audit while rendering its events concurrently
async fn execute_with_events(
    audit: impl std::future::Future<Output = Result<AuditReport, Error>>,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<AuditReport, CliError> {
    let mut audit = Box::pin(audit);

    loop {
        select! {
            // Audit completed
            result = &mut audit => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result.map_err(CliError::from);
            }

            // Event received
            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(event);
                }
                // A closed channel just means nobody emits anymore;
                // keep waiting for the audit to finish
            }
        }
    }
}

/// Apply CLI flags onto the loaded configuration (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs) -> Result<(), CliError> {
    if global.verbose {
        config.general.verbose_diagnostics = true;
    }
    if let Some(secs) = global.timeout {
        if secs == 0 {
            return Err(CliError::InvalidArguments(
                "--timeout must be at least 1 second".to_string(),
            ));
        }
        config.network.call_timeout_secs = secs;
    }
    Ok(())
}

fn init_tracing() {
    // Quiet by default; RUST_LOG opts into diagnostics
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
