//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use gantry_core::config::{load_config_or_default, Config};
use gantry_core::ProjectProperties;

use commands::{
    CompletionsCommand, InitCommand, PublishCommand, RunCommand, TasksCommand, ValidateCommand,
    VersionCommand,
};

/// Gantry - Build orchestration for version-matrix testing and publishing
#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Project property as key=value (can be repeated)
    #[arg(short = 'P', long = "property", global = true, value_name = "KEY=VALUE")]
    pub properties: Vec<String>,

    /// Use this artifact version instead of the configured one
    #[arg(long, global = true, env = "GANTRY_VERSION")]
    pub version_override: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run tasks and their dependencies
    Run(RunCommand),

    /// List registered tasks and rules
    Tasks(TasksCommand),

    /// Publish the artifact to the resolved repository
    Publish(PublishCommand),

    /// Show the display version
    Version(VersionCommand),

    /// Validate configuration and the task graph
    Validate(ValidateCommand),

    /// Write a default configuration file
    Init(InitCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Configuration and properties for one invocation
#[derive(Debug)]
pub struct ProjectContext {
    /// Directory the command runs in
    pub root: PathBuf,
    /// Loaded (or default) configuration
    pub config: Config,
    /// Config file, if one was found
    pub config_path: Option<PathBuf>,
    /// Merged project properties
    pub properties: ProjectProperties,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Run(ref cmd) => cmd.execute(&self),
            Commands::Tasks(ref cmd) => cmd.execute(&self),
            Commands::Publish(ref cmd) => cmd.execute(&self),
            Commands::Version(ref cmd) => cmd.execute(&self),
            Commands::Validate(ref cmd) => cmd.execute(&self),
            Commands::Init(ref cmd) => cmd.execute(&self),
            Commands::Completions(ref cmd) => cmd.execute(&self),
        }
    }

    /// Load configuration and merge project properties for the current directory
    pub fn load_project(&self) -> anyhow::Result<ProjectContext> {
        let root = std::env::current_dir()?;
        let (mut config, config_path) = load_config_or_default(&root)?;

        if let Some(version) = &self.version_override {
            debug!(configured = %config.version, version = %version, "version overridden");
            config.version = version.clone();
        }

        let properties =
            ProjectProperties::resolve(&config.properties, std::env::vars(), &self.properties)?;

        Ok(ProjectContext {
            root,
            config,
            config_path,
            properties,
        })
    }

    /// Whether human-readable output should be printed
    pub fn prints_text(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Text
    }
}
