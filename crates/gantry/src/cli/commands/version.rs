//! Version command

use clap::Args;
use tracing::info;

use gantry_core::{DisplayVersion, PublishTarget};

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Show the display version
#[derive(Debug, Args)]
pub struct VersionCommand {
    /// Print the configured version without the build stamp
    #[arg(long)]
    pub raw: bool,
}

impl VersionCommand {
    /// Execute the version command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(raw = self.raw, "executing version command");
        let ctx = cli.load_project()?;
        let version = &ctx.config.version;
        let display = DisplayVersion::current().render(version);
        let target = PublishTarget::for_version(version, &ctx.config.publish.snapshot_suffix);

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "version": version,
                    "display_version": display,
                    "target": target,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                let shown = if self.raw { version } else { &display };
                if cli.quiet {
                    println!("{}", shown);
                } else {
                    println!("{}", output::key_value("Version", shown));
                    if cli.verbose {
                        println!("{}", output::key_value("Target", &target.to_string()));
                        if let Some(path) = &ctx.config_path {
                            println!(
                                "{}",
                                output::key_value("Config", &path.display().to_string())
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
