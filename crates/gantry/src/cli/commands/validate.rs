//! Validate command

use clap::Args;
use console::style;
use tracing::info;

use gantry_core::config::{load_config_from_dir, SigningConfig};
use gantry_core::{ConfigError, CredentialSet, GantryError, ProjectProperties};
use gantry_tasks::configure;

use crate::cli::{Cli, OutputFormat};

/// Validate configuration and the task graph
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Strict mode - treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Validation reported errors
#[derive(Debug, thiserror::Error)]
#[error("validation failed with {0} error(s)")]
pub struct ValidationFailed(pub usize);

impl ValidateCommand {
    /// Execute the validate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(strict = self.strict, "executing validate command");
        let cwd = std::env::current_dir()?;

        let mut errors: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        let (config, config_path) = match load_config_from_dir(&cwd) {
            Ok((c, p)) => (Some(c), Some(p)),
            Err(GantryError::Config(ConfigError::NotFound(_))) => {
                warnings.push("No configuration file found, defaults apply".to_string());
                (Some(Default::default()), None)
            }
            Err(e) => {
                errors.push(format!("Configuration: {}", e));
                (None, None)
            }
        };

        if let Some(mut cfg) = config {
            if let Some(version) = &cli.version_override {
                cfg.version = version.clone();
            }
            match ProjectProperties::resolve(&cfg.properties, std::env::vars(), &cli.properties) {
                Ok(props) => {
                    if let Err(e) = configure(&cfg, &props) {
                        errors.push(format!("Task graph: {}", e));
                    }
                    if let Some(warning) = credential_warning(&props, &cfg.signing) {
                        warnings.push(warning);
                    }
                }
                Err(e) => errors.push(format!("Properties: {}", e)),
            }
        }

        if self.strict {
            errors.append(&mut warnings);
        }

        let passed = errors.is_empty();

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "valid": passed,
                    "config_path": config_path.map(|p| p.to_string_lossy().to_string()),
                    "errors": errors,
                    "warnings": warnings
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    println!("{}", style("Validation Results").bold());
                    println!();

                    if let Some(path) = config_path {
                        println!("Config: {}", style(path.display()).cyan());
                        println!();
                    }

                    if !errors.is_empty() {
                        println!("{}", style("Errors:").red().bold());
                        for error in &errors {
                            println!("  {} {}", style("✗").red(), error);
                        }
                        println!();
                    }

                    if !warnings.is_empty() {
                        println!("{}", style("Warnings:").yellow().bold());
                        for warning in &warnings {
                            println!("  {} {}", style("!").yellow(), warning);
                        }
                        println!();
                    }

                    if passed {
                        if warnings.is_empty() {
                            println!("{}", style("✓ All checks passed").green().bold());
                        } else {
                            println!(
                                "{} with {} warning(s)",
                                style("✓ Validation passed").green().bold(),
                                warnings.len()
                            );
                        }
                    }
                }
            }
        }

        if !passed {
            return Err(ValidationFailed(errors.len()).into());
        }

        Ok(())
    }
}

/// Warn when only one of the publishing credentials has a value
fn credential_warning(props: &ProjectProperties, signing: &SigningConfig) -> Option<String> {
    CredentialSet::from_properties(props, signing)
        .is_partial()
        .then(|| "Only one publishing credential is set, signing will be skipped".to_string())
}
