//! `config`: inspect the effective configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::Path;

use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the merged configuration with secrets redacted
    Show,
    /// Load and validate the configuration
    Validate,
}

pub fn execute(args: ConfigArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;

    match args.command {
        ConfigCommands::Show => {
            let redacted = config.redacted();
            if json_mode {
                println!("{}", serde_json::to_string_pretty(&redacted)?);
            } else {
                print!("{}", serde_yaml::to_string(&redacted)?);
            }
        }
        ConfigCommands::Validate => {
            let sources: Vec<&str> = config.source_instances().iter().map(|s| s.name()).collect();
            if json_mode {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "valid": true,
                        "sources": sources,
                        "failure_types": config.features.enabled_failure_types(),
                    }))?
                );
            } else {
                println!("Configuration is valid. Sources: {}", sources.join(", "));
            }
        }
    }
    Ok(())
}
