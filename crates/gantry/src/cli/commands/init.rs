//! Init command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use gantry_core::config::defaults::{default_config_toml, DEFAULT_CONFIG_TOML};

use crate::cli::output;
use crate::cli::Cli;

/// Write a default configuration file
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(force = self.force, "executing init command");
        let cwd = std::env::current_dir()?;
        let config_path = self
            .output
            .clone()
            .unwrap_or_else(|| cwd.join(DEFAULT_CONFIG_TOML));

        let written = write_config(&config_path, self.force)?;

        if !cli.quiet {
            output::success(&format!("Created {}", written.display()));
            output::info("Edit [matrix] versions and [publish] settings to fit your project");
        }
        Ok(())
    }
}

fn write_config(path: &std::path::Path, force: bool) -> anyhow::Result<PathBuf> {
    if path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    std::fs::write(path, default_config_toml())?;
    Ok(path.to_path_buf())
}
