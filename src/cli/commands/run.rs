//! `run`: sweep the configured queues.

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{presets, Cell, ContentArrangement, Table};
use std::path::Path;

use crate::application::{build_sweep_daemon, CycleReport};
use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Log what would be removed without removing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl CommandOutput for CycleReport {
    fn to_human(&self) -> String {
        if self.evaluations.is_empty() && self.skipped_sources.is_empty() {
            return "Nothing to evaluate: no failure type is enabled.".to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(presets::NOTHING)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("SOURCE"),
                Cell::new("FAILURE TYPE"),
                Cell::new("AFFECTED"),
                Cell::new("REMOVED"),
            ]);
        for evaluation in &self.evaluations {
            table.add_row(vec![
                Cell::new(&evaluation.source),
                Cell::new(evaluation.failure_type),
                Cell::new(evaluation.affected),
                Cell::new(evaluation.removed),
            ]);
        }

        let mut lines = vec![
            format!("Cycle {}: {} download(s) removed", self.cycle, self.total_removed()),
            table.to_string(),
        ];
        if !self.skipped_sources.is_empty() {
            lines.push(format!("Skipped: {}", self.skipped_sources.join(", ")));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: RunArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))
        .context("Failed to initialize logging")?;

    let mut daemon = build_sweep_daemon(&config, args.dry_run).await?;

    if args.once {
        let report = daemon.run_cycle().await;
        output(&report, json_mode);
    } else {
        daemon.run().await;
    }
    Ok(())
}
