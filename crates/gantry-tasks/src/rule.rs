//! Task rules
//!
//! A rule claims every requested task name that starts with a literal prefix
//! and materializes the task on first request. Rules are kept in an explicit
//! registry keyed by prefix and consulted only after an exact lookup misses.

use std::collections::BTreeMap;

use gantry_core::config::{ExceptionFormat, MatrixConfig};
use tracing::{debug, warn};

use crate::graph::GraphError;
use crate::predicate::CompatibilityPredicate;
use crate::task::{Task, TaskAction, TaskName, TestSpec};

/// Matches task names against a literal prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatcher {
    prefix: String,
}

impl NameMatcher {
    /// Create a matcher for the given prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The literal prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The remainder of `name` after the prefix, or `None` if not claimed.
    ///
    /// The remainder is returned verbatim, including an empty one.
    pub fn matches<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(self.prefix.as_str())
    }
}

/// Builds a task for a claimed name
pub trait TaskFactory: Send + Sync {
    /// Create the task registered under `name` for `parameter`
    fn create(&self, name: &TaskName, parameter: &str) -> Task;
}

impl<F> TaskFactory for F
where
    F: Fn(&TaskName, &str) -> Task + Send + Sync,
{
    fn create(&self, name: &TaskName, parameter: &str) -> Task {
        self(name, parameter)
    }
}

/// A prefix matcher paired with the factory it dispatches to
pub struct TaskRule {
    description: String,
    matcher: NameMatcher,
    factory: Box<dyn TaskFactory>,
}

impl TaskRule {
    /// Create a rule described as `Pattern: <prefix><ID>`
    pub fn new(prefix: impl Into<String>, factory: impl TaskFactory + 'static) -> Self {
        let matcher = NameMatcher::new(prefix);
        Self {
            description: format!("Pattern: {}<ID>", matcher.prefix()),
            matcher,
            factory: Box::new(factory),
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The rule's matcher
    pub fn matcher(&self) -> &NameMatcher {
        &self.matcher
    }

    /// Build the task for `name` if this rule claims it
    pub fn apply(&self, name: &str) -> Option<Task> {
        let parameter = self.matcher.matches(name)?;
        debug!(rule = %self.description, name, parameter, "rule claimed task name");
        Some(self.factory.create(&TaskName::new(name), parameter))
    }
}

impl std::fmt::Debug for TaskRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRule")
            .field("description", &self.description)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

/// Registry of task rules keyed by literal prefix
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: BTreeMap<String, TaskRule>,
}

impl RuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule; each prefix may be registered once
    pub fn add(&mut self, rule: TaskRule) -> Result<(), GraphError> {
        let prefix = rule.matcher.prefix().to_string();
        if self.rules.contains_key(&prefix) {
            return Err(GraphError::DuplicateRule(prefix));
        }
        self.rules.insert(prefix, rule);
        Ok(())
    }

    /// The rule claiming `name`; the longest matching prefix wins
    pub fn find(&self, name: &str) -> Option<&TaskRule> {
        self.rules
            .values()
            .filter(|rule| rule.matcher.matches(name).is_some())
            .max_by_key(|rule| rule.matcher.prefix().len())
    }

    /// All rules, ordered by prefix
    pub fn iter(&self) -> impl Iterator<Item = &TaskRule> {
        self.rules.values()
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Creates the compatibility test task for a matrix version
#[derive(Debug, Clone)]
pub struct TestTaskFactory {
    command: String,
    system_property: String,
    category: String,
    exception_format: ExceptionFormat,
    known_versions: Vec<String>,
}

impl TestTaskFactory {
    /// Factory configured from the matrix section
    pub fn from_config(matrix: &MatrixConfig) -> Self {
        Self {
            command: matrix.test_command.clone(),
            system_property: matrix.system_property.clone(),
            category: matrix.category.clone(),
            exception_format: matrix.exception_format,
            known_versions: matrix.versions.clone(),
        }
    }
}

impl TaskFactory for TestTaskFactory {
    fn create(&self, name: &TaskName, parameter: &str) -> Task {
        // Suffixes outside the matrix are accepted; the predicate decides.
        if !self.known_versions.iter().any(|v| v == parameter) {
            warn!(
                task = %name,
                version = parameter,
                "generating test task for a version outside the matrix"
            );
        }

        let spec = TestSpec {
            command: self.command.clone(),
            system_properties: BTreeMap::from([(
                self.system_property.clone(),
                parameter.to_string(),
            )]),
            include_categories: vec![self.category.clone()],
            exception_format: self.exception_format,
        };

        Task::new(name.clone(), TaskAction::Test(spec))
            .with_group("verification")
            .with_description(format!("Runs the test suite against {}", parameter))
            .with_only_if(CompatibilityPredicate::new(parameter))
    }
}
