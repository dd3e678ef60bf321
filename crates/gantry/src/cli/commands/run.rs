//! Run command: resolve requested tasks and execute them

use std::sync::Arc;

use clap::Args;
use console::style;
use tracing::info;

use gantry_tasks::reporter::TracingReporter;
use gantry_tasks::{
    configure, ConfiguredProject, EnvFactSource, ExecutionPlan, SchedulerOptions, TaskEvent,
    TaskName, TaskReporter, TaskReporterRegistry, TaskResult, TaskScheduler, TaskStatus,
};

use crate::cli::output::{self, plural, status_glyph};
use crate::cli::{Cli, OutputFormat, ProjectContext};

/// Run tasks and everything they depend on
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Tasks to run (e.g., check testGradle5.6.4)
    #[arg(required = true)]
    pub tasks: Vec<String>,

    /// Maximum concurrent tasks
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Show the execution plan and evaluate predicates without running commands
    #[arg(long)]
    pub dry_run: bool,

    /// Continue running independent tasks when one fails
    #[arg(long)]
    pub continue_on_error: bool,

    /// Platform spec version to evaluate predicates against
    #[arg(long, value_name = "VERSION")]
    pub spec_version: Option<String>,
}

/// One or more tasks failed
#[derive(Debug, thiserror::Error)]
#[error("{0} task(s) failed")]
pub struct TasksFailed(pub usize);

/// How a batch of tasks should be executed
#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    pub concurrency: Option<usize>,
    pub dry_run: bool,
    pub continue_on_error: bool,
    pub spec_version: Option<String>,
}

impl RunCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            tasks = ?self.tasks,
            dry_run = self.dry_run,
            continue_on_error = self.continue_on_error,
            "executing run command"
        );
        let ctx = cli.load_project()?;
        let project = configure(&ctx.config, &ctx.properties)?;
        let settings = RunSettings {
            concurrency: self.concurrency,
            dry_run: self.dry_run,
            continue_on_error: self.continue_on_error,
            spec_version: self.spec_version.clone(),
        };

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(run_tasks(cli, &ctx, project, &self.tasks, &settings))?;
        Ok(())
    }
}

/// Resolve `requested` in a configured project and execute the resulting plan
pub async fn run_tasks(
    cli: &Cli,
    ctx: &ProjectContext,
    mut project: ConfiguredProject,
    requested: &[String],
    settings: &RunSettings,
) -> anyhow::Result<Vec<TaskResult>> {
    let mut names = Vec::with_capacity(requested.len());
    for name in requested {
        if project.graph.resolve(name)?.is_none() {
            anyhow::bail!("Task '{}' not found", name);
        }
        names.push(TaskName::from(name.as_str()));
    }

    let plan = ExecutionPlan::build(&project.graph, &names)?;

    if cli.prints_text() {
        println!();
        output::info(&format!(
            "{} task{} to execute",
            plan.len(),
            plural(plan.len())
        ));
        if cli.verbose || settings.dry_run {
            println!();
            println!("{}", plan.describe());
        }
        if settings.dry_run {
            println!(
                "{}",
                style("[DRY RUN - commands will not be executed]")
                    .yellow()
                    .bold()
            );
        }
        println!();
    }

    // Flag, then config override, then the environment at execution time
    let spec_version = settings
        .spec_version
        .clone()
        .or_else(|| ctx.config.platform.spec_version.clone());
    let facts = Arc::new(EnvFactSource::new().with_spec_version(spec_version));

    let mut reporters = TaskReporterRegistry::empty();
    reporters.register(Arc::new(TracingReporter));
    if cli.prints_text() {
        reporters.register(Arc::new(ConsoleReporter::new(cli.verbose)));
    }

    let options = SchedulerOptions {
        concurrency: settings
            .concurrency
            .unwrap_or(ctx.config.tasks.concurrency),
        continue_on_error: settings.continue_on_error,
        dry_run: settings.dry_run,
        root_dir: ctx.root.clone(),
    };
    let scheduler = TaskScheduler::new(options, facts, Arc::new(reporters));
    let results = scheduler.execute(&plan).await;

    let failed: Vec<&TaskResult> = results.iter().filter(|r| r.status.is_failure()).collect();

    if cli.format == OutputFormat::Json {
        let skipped = results
            .iter()
            .filter(|r| matches!(r.status, TaskStatus::Skipped(_)))
            .count();
        let summary = serde_json::json!({
            "total": results.len(),
            "succeeded": results.iter().filter(|r| r.status.is_success()).count(),
            "skipped": skipped,
            "failed": failed.len(),
            "tasks": results,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if cli.prints_text() && !failed.is_empty() {
        println!();
        println!(
            "  {} {}/{} tasks failed:",
            style("✗").red().bold(),
            failed.len(),
            results.len()
        );
        for r in &failed {
            if let TaskStatus::Failed(ref err) = r.status {
                println!("    {} {}: {}", status_glyph(&r.status), r.name, err);
            }
        }
    }

    if !failed.is_empty() {
        return Err(TasksFailed(failed.len()).into());
    }
    Ok(results)
}

/// Console reporter with live output
struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl TaskReporter for ConsoleReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::Started { name, command } => {
                println!(
                    "  {} {} {}",
                    style("▸").dim(),
                    style(name).bold(),
                    if self.verbose {
                        style(format!("({})", command)).dim().to_string()
                    } else {
                        String::new()
                    }
                );
            }
            TaskEvent::Output {
                name,
                line,
                is_stderr,
            } => {
                if self.verbose {
                    if *is_stderr {
                        println!("    {} {}", style(format!("[{}]", name)).red().dim(), line);
                    } else {
                        println!("    {} {}", style(format!("[{}]", name)).dim(), line);
                    }
                }
            }
            TaskEvent::Completed { name, duration } => {
                println!(
                    "  {} {} {}",
                    style("✓").green(),
                    style(name).green(),
                    style(format!("{:.1}s", duration.as_secs_f64())).dim()
                );
            }
            TaskEvent::Failed {
                name,
                duration,
                error,
            } => {
                println!(
                    "  {} {} {} {}",
                    style("✗").red(),
                    style(name).red(),
                    style(format!("{:.1}s", duration.as_secs_f64())).dim(),
                    style(error).red().dim()
                );
            }
            TaskEvent::Skipped { name, reason } => {
                println!(
                    "  {} {} {}",
                    style("○").yellow(),
                    style(name).yellow(),
                    style(format!("({})", reason)).dim()
                );
            }
            TaskEvent::NotRun { name, reason } => {
                println!(
                    "  {} {} {}",
                    style("-").dim(),
                    style(name).dim(),
                    style(format!("({})", reason)).dim()
                );
            }
            TaskEvent::WaveStarted { wave, task_count } => {
                if self.verbose {
                    println!(
                        "  {} Wave {} ({} task{})",
                        style("─").dim(),
                        wave,
                        task_count,
                        plural(*task_count)
                    );
                }
            }
            TaskEvent::AllCompleted {
                total,
                succeeded,
                skipped,
                failed,
                duration,
            } => {
                println!();
                println!(
                    "  {} {}/{} succeeded, {} skipped, {} failed ({:.1}s)",
                    if *failed == 0 {
                        style("✓").green().bold()
                    } else {
                        style("✗").red().bold()
                    },
                    succeeded,
                    total,
                    skipped,
                    failed,
                    duration.as_secs_f64()
                );
            }
        }
    }
}
