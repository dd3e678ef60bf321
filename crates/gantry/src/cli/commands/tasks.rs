//! Tasks command: list registered tasks and rules

use std::collections::BTreeMap;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use gantry_tasks::{configure, TaskGraph};

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// List registered tasks grouped, plus task rules
#[derive(Debug, Args)]
pub struct TasksCommand {
    /// Also show each task's dependencies and command
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
struct TaskListing {
    name: String,
    group: Option<String>,
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TaskReport {
    tasks: Vec<TaskListing>,
    rules: Vec<String>,
}

impl TasksCommand {
    /// Execute the tasks command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(all = self.all, "executing tasks command");
        let ctx = cli.load_project()?;
        let project = configure(&ctx.config, &ctx.properties)?;
        let report = self.report(&project.graph);

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    self.print_text(&report);
                }
            }
        }
        Ok(())
    }

    fn report(&self, graph: &TaskGraph) -> TaskReport {
        let tasks = graph
            .tasks()
            .map(|task| TaskListing {
                name: task.name.to_string(),
                group: task.group.clone(),
                description: task.description.clone(),
                command: self
                    .all
                    .then(|| task.action.command().map(str::to_string))
                    .flatten(),
                dependencies: if self.all {
                    graph
                        .dependencies_of(task.name.as_str())
                        .iter()
                        .map(|d| d.to_string())
                        .collect()
                } else {
                    Vec::new()
                },
            })
            .collect();
        let rules = graph
            .rules()
            .iter()
            .map(|rule| rule.description().to_string())
            .collect();
        TaskReport { tasks, rules }
    }

    fn print_text(&self, report: &TaskReport) {
        let mut groups: BTreeMap<&str, Vec<&TaskListing>> = BTreeMap::new();
        for task in &report.tasks {
            groups
                .entry(task.group.as_deref().unwrap_or("other"))
                .or_default()
                .push(task);
        }

        for (group, tasks) in groups {
            println!("{}", output::header(&format!("{} tasks", capitalize(group))));
            for task in tasks {
                match &task.description {
                    Some(desc) => println!("  {} - {}", style(&task.name).cyan(), desc),
                    None => println!("  {}", style(&task.name).cyan()),
                }
                if let Some(command) = &task.command {
                    println!("      {}", style(command).dim());
                }
                if !task.dependencies.is_empty() {
                    println!(
                        "      {} {}",
                        style("depends on").dim(),
                        task.dependencies.join(", ")
                    );
                }
            }
            println!();
        }

        if !report.rules.is_empty() {
            println!("{}", output::header("Rules"));
            for rule in &report.rules {
                println!("  {}", rule);
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
