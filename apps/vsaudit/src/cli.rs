//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// vsaudit - storage auditor for virtualization clusters
#[derive(Parser)]
#[command(name = "vsaudit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Detect orphaned virtual disks and aging snapshots")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Recorded inventory dump to audit (JSON)
    #[arg(long, global = true, value_name = "PATH")]
    pub dump: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit per-object diagnostic events
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the per-call timeout, in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a full audit pass and report everything
    Audit,

    /// Report orphaned disk files only
    Orphans,

    /// Report snapshots and their ages only
    #[command(alias = "snaps")]
    Snapshots {
        /// Highlight snapshots at least this old, in days
        #[arg(long, value_name = "DAYS")]
        age_warning: Option<i64>,
    },
}
