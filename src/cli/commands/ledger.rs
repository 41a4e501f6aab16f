//! `ledger`: inspect or reset the persisted defectiveness ledger.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::application::open_defect_ledger;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{LedgerBackend, LedgerSnapshot};
use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct LedgerArgs {
    #[command(subcommand)]
    pub command: LedgerCommands,
}

#[derive(Subcommand, Debug)]
pub enum LedgerCommands {
    /// List tracked downloads and their attempt counts
    Show,
    /// Write the ledger as nested JSON (source -> failure type -> download id)
    Export {
        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Forget every tracked download
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Serialize)]
pub struct LedgerRowOutput {
    pub source: String,
    pub failure_type: String,
    pub download_id: String,
    pub title: String,
    pub attempts: u32,
}

#[derive(Debug, Serialize)]
pub struct LedgerListOutput {
    pub entries: Vec<LedgerRowOutput>,
    pub total: usize,
}

impl From<&LedgerSnapshot> for LedgerListOutput {
    fn from(snapshot: &LedgerSnapshot) -> Self {
        let entries: Vec<LedgerRowOutput> = snapshot
            .rows()
            .into_iter()
            .map(|(source, failure_type, download_id, entry)| LedgerRowOutput {
                source,
                failure_type: failure_type.to_string(),
                download_id,
                title: entry.title,
                attempts: entry.attempts,
            })
            .collect();
        Self {
            total: entries.len(),
            entries,
        }
    }
}

impl CommandOutput for LedgerListOutput {
    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No tracked downloads.".to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(presets::NOTHING)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("SOURCE"),
                Cell::new("FAILURE TYPE"),
                Cell::new("DOWNLOAD ID"),
                Cell::new("TITLE"),
                Cell::new("ATTEMPTS").set_alignment(CellAlignment::Right),
            ]);
        for row in &self.entries {
            table.add_row(vec![
                Cell::new(&row.source),
                Cell::new(&row.failure_type),
                Cell::new(truncate(&row.download_id, 16)),
                Cell::new(truncate(&row.title, 50)),
                Cell::new(row.attempts).set_alignment(CellAlignment::Right),
            ]);
        }
        format!("{} tracked download(s):\n{table}", self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: LedgerArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    if config.ledger.backend != LedgerBackend::Sqlite {
        bail!("The ledger is only persisted with `ledger.backend: sqlite`; the in-memory ledger lives inside `run`");
    }
    let ledger = open_defect_ledger(&config.ledger).await?;

    match args.command {
        LedgerCommands::Show => {
            let snapshot = ledger.snapshot().await.context("Failed to read ledger")?;
            output(&LedgerListOutput::from(&snapshot), json_mode);
        }
        LedgerCommands::Export { output: path } => {
            let snapshot = ledger.snapshot().await.context("Failed to read ledger")?;
            let body = serde_json::to_string_pretty(&snapshot)?;
            match path {
                Some(path) => {
                    std::fs::write(&path, body)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported {} entries to {}", snapshot.len(), path.display());
                }
                None => println!("{body}"),
            }
        }
        LedgerCommands::Clear { yes } => {
            if !yes {
                bail!("Refusing to clear the ledger without --yes");
            }
            let removed = ledger.clear().await.context("Failed to clear ledger")?;
            if json_mode {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else {
                println!("Removed {removed} ledger entries");
            }
        }
    }
    Ok(())
}
