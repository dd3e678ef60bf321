//! CLI commands

mod completions;
mod init;
mod publish;
mod run;
mod tasks;
mod validate;
mod version;

pub use completions::CompletionsCommand;
pub use init::InitCommand;
pub use publish::PublishCommand;
pub use run::{RunCommand, TasksFailed};
pub use tasks::TasksCommand;
pub use validate::{ValidateCommand, ValidationFailed};
pub use version::VersionCommand;
