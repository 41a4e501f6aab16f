//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::config::ConfigArgs;
use crate::cli::commands::ledger::LedgerArgs;
use crate::cli::commands::run::RunArgs;

#[derive(Parser, Debug)]
#[command(name = "queue-sweeper")]
#[command(about = "Removes stuck, failed and policy-violating downloads from *arr queues", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./queue-sweeper.yaml)
    #[arg(short, long, global = true, env = "SWEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sweep the configured queues, once or on a timer
    Run(RunArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),

    /// Inspect or reset the persisted defectiveness ledger
    Ledger(LedgerArgs),
}
