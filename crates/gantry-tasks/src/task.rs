//! Task types and definitions

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use gantry_core::config::ExceptionFormat;
use serde::{Deserialize, Serialize};

use crate::predicate::OnlyIf;

/// Environment variable listing the included test categories
pub const INCLUDE_CATEGORIES_ENV: &str = "TEST_INCLUDE_CATEGORIES";

/// Environment variable carrying the exception format
pub const EXCEPTION_FORMAT_ENV: &str = "TEST_EXCEPTION_FORMAT";

/// Name a task is registered and requested under
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskName(String);

impl TaskName {
    /// Create a new task name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for TaskName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A test run restricted to one compatibility target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSpec {
    /// Command that runs the test suite
    pub command: String,
    /// System properties handed to the test process
    pub system_properties: BTreeMap<String, String>,
    /// Only tests tagged with one of these categories run
    pub include_categories: Vec<String>,
    /// How test failures are rendered
    pub exception_format: ExceptionFormat,
}

impl TestSpec {
    /// Environment exported to the test process.
    ///
    /// `gradle.under.test` becomes `GRADLE_UNDER_TEST`.
    pub fn environment(&self) -> BTreeMap<String, String> {
        let mut env: BTreeMap<String, String> = self
            .system_properties
            .iter()
            .map(|(k, v)| (property_env_name(k), v.clone()))
            .collect();
        env.insert(
            INCLUDE_CATEGORIES_ENV.to_string(),
            self.include_categories.join(","),
        );
        env.insert(
            EXCEPTION_FORMAT_ENV.to_string(),
            self.exception_format.as_str().to_string(),
        );
        env
    }
}

fn property_env_name(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

/// A plain shell command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellSpec {
    /// Shell command to execute
    pub command: String,
    /// Extra environment variables
    pub env: BTreeMap<String, String>,
}

/// What a task does when it executes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    /// No action of its own; exists to aggregate dependencies
    Lifecycle,
    /// Run the test suite
    Test(TestSpec),
    /// Run a shell command
    Shell(ShellSpec),
}

impl TaskAction {
    /// Command line, if the action runs one
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Lifecycle => None,
            Self::Test(spec) => Some(&spec.command),
            Self::Shell(spec) => Some(&spec.command),
        }
    }

    /// Environment for the command
    pub fn environment(&self) -> BTreeMap<String, String> {
        match self {
            Self::Lifecycle => BTreeMap::new(),
            Self::Test(spec) => spec.environment(),
            Self::Shell(spec) => spec.env.clone(),
        }
    }
}

/// A registered unit of work
#[derive(Debug, Clone)]
pub struct Task {
    /// Task name
    pub name: TaskName,
    /// Group shown in task listings (e.g. "verification")
    pub group: Option<String>,
    /// Human-readable description
    pub description: Option<String>,
    /// What the task does
    pub action: TaskAction,
    /// Predicate checked right before execution
    pub only_if: Option<Arc<dyn OnlyIf>>,
}

impl Task {
    /// Create a task with the given action
    pub fn new(name: impl Into<TaskName>, action: TaskAction) -> Self {
        Self {
            name: name.into(),
            group: None,
            description: None,
            action,
            only_if: None,
        }
    }

    /// Create a lifecycle task
    pub fn lifecycle(name: impl Into<TaskName>) -> Self {
        Self::new(name, TaskAction::Lifecycle)
    }

    /// Set the group
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach an execution predicate
    pub fn with_only_if(mut self, predicate: impl OnlyIf + 'static) -> Self {
        self.only_if = Some(Arc::new(predicate));
        self
    }

    /// The test configuration, for test tasks
    pub fn test_spec(&self) -> Option<&TestSpec> {
        match &self.action {
            TaskAction::Test(spec) => Some(spec),
            _ => None,
        }
    }
}
