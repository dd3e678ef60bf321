//! Publish command
//!
//! Prints where the artifact goes and whether it must be signed, then runs
//! the `publish` lifecycle task.

use clap::Args;
use tracing::info;

use gantry_core::{DisplayVersion, PublishPlan};
use gantry_tasks::configure;
use gantry_tasks::project::PUBLISH_TASK;

use super::run::{run_tasks, RunSettings};
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Publish the artifact to the resolved repository
#[derive(Debug, Args)]
pub struct PublishCommand {
    /// Resolve the plan and evaluate predicates without running commands
    #[arg(long)]
    pub dry_run: bool,

    /// Continue after a failed task
    #[arg(long)]
    pub continue_on_error: bool,
}

impl PublishCommand {
    /// Execute the publish command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(dry_run = self.dry_run, "executing publish command");
        let ctx = cli.load_project()?;
        let project = configure(&ctx.config, &ctx.properties)?;
        let plan = project.publish.clone();
        let display = DisplayVersion::current().render(&plan.version);

        match cli.format {
            OutputFormat::Json => {
                let summary = serde_json::json!({
                    "version": plan.version,
                    "display_version": display,
                    "target": plan.target,
                    "repository": {
                        "name": plan.repository.name,
                        "url": plan.repository.url.as_str(),
                    },
                    "signing": plan.signing,
                    "dry_run": self.dry_run,
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    println!("{}", output::header("Publishing"));
                    println!("{}", output::key_value("Version", &display));
                    println!("{}", output::key_value("Target", &plan.target.to_string()));
                    println!(
                        "{}",
                        output::key_value(
                            "Repository",
                            &format!("{} ({})", plan.repository.name, plan.repository.url)
                        )
                    );
                    println!("{}", output::key_value("Signing", &plan.signing.to_string()));
                    if !plan.signing.is_required() {
                        output::warning("Credentials incomplete, publishing unsigned");
                    }
                }
            }
        }

        let settings = RunSettings {
            dry_run: self.dry_run,
            continue_on_error: self.continue_on_error,
            ..Default::default()
        };
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(run_tasks(
            cli,
            &ctx,
            project,
            &[PUBLISH_TASK.to_string()],
            &settings,
        ))?;

        if cli.prints_text() && !self.dry_run {
            match published_message(&display, &plan, ctx.config.publish.command.is_some()) {
                Some(message) => output::success(&message),
                None => output::warning("No [publish] command configured, nothing was uploaded"),
            }
        }
        Ok(())
    }
}

/// Success line for a finished run, or `None` when no upload command ran
fn published_message(display: &str, plan: &PublishPlan, uploaded: bool) -> Option<String> {
    uploaded.then(|| format!("Published {} to {}", display, plan.target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::config::Config;
    use gantry_core::ProjectProperties;

    fn plan(version: &str) -> PublishPlan {
        let mut config = Config::default();
        config.version = version.to_string();
        PublishPlan::resolve(&config, &ProjectProperties::new()).unwrap()
    }

    #[test]
    fn test_published_message_requires_upload_command() {
        let plan = plan("1.0-SNAPSHOT");
        assert_eq!(
            published_message("1.0-SNAPSHOT", &plan, true).as_deref(),
            Some("Published 1.0-SNAPSHOT to snapshots")
        );
        assert_eq!(published_message("1.0-SNAPSHOT", &plan, false), None);
    }
}
