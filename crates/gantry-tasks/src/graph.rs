//! Task graph: registration, rule resolution and dependency edges

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::rule::{RuleRegistry, TaskRule};
use crate::task::{Task, TaskName};

/// Registered tasks and the dependency edges between them
#[derive(Debug, Default)]
pub struct TaskGraph {
    /// Tasks by name
    tasks: HashMap<TaskName, Arc<Task>>,
    /// Registration order
    order: Vec<TaskName>,
    /// Outgoing dependency edges, in insertion order
    dependencies: HashMap<TaskName, Vec<TaskName>>,
    /// Rules consulted when a lookup misses
    rules: RuleRegistry,
}

impl TaskGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. A name can be registered at most once.
    pub fn register(&mut self, task: Task) -> Result<Arc<Task>, GraphError> {
        if self.tasks.contains_key(&task.name) {
            return Err(GraphError::DuplicateTask(task.name.to_string()));
        }

        let name = task.name.clone();
        let task = Arc::new(task);
        self.tasks.insert(name.clone(), task.clone());
        self.dependencies.insert(name.clone(), Vec::new());
        self.order.push(name.clone());
        debug!(task = %name, "task registered");
        Ok(task)
    }

    /// Add a task rule
    pub fn add_rule(&mut self, rule: TaskRule) -> Result<(), GraphError> {
        info!(rule = rule.description(), "task rule added");
        self.rules.add(rule)
    }

    /// Look up a registered task without consulting rules
    pub fn get(&self, name: &str) -> Option<Arc<Task>> {
        self.tasks.get(name).cloned()
    }

    /// Whether a task is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Resolve a requested name.
    ///
    /// Registered tasks are returned as-is; otherwise the rule claiming the
    /// name creates and registers the task. `Ok(None)` means no task and
    /// no rule claims the name.
    #[instrument(skip(self))]
    pub fn resolve(&mut self, name: &str) -> Result<Option<Arc<Task>>, GraphError> {
        if let Some(task) = self.get(name) {
            return Ok(Some(task));
        }

        let Some(task) = self.rules.find(name).and_then(|rule| rule.apply(name)) else {
            debug!("no task or rule for name");
            return Ok(None);
        };

        if task.name.as_str() != name {
            return Err(GraphError::RuleNameMismatch {
                requested: name.to_string(),
                created: task.name.to_string(),
            });
        }

        self.register(task).map(Some)
    }

    /// Resolve a name that must exist
    pub fn named(&mut self, name: &str) -> Result<Arc<Task>, GraphError> {
        self.resolve(name)?
            .ok_or_else(|| GraphError::UnresolvedTask(name.to_string()))
    }

    /// Make `task` depend on `dependency`. Both must be registered.
    pub fn depends_on(&mut self, task: &str, dependency: &str) -> Result<(), GraphError> {
        if !self.contains(dependency) {
            return Err(GraphError::UnknownTask(dependency.to_string()));
        }
        if task == dependency {
            return Err(GraphError::CyclicDependency(task.to_string()));
        }

        let edges = self
            .dependencies
            .get_mut(task)
            .ok_or_else(|| GraphError::UnknownTask(task.to_string()))?;

        if !edges.iter().any(|d| d.as_str() == dependency) {
            edges.push(TaskName::from(dependency));
            debug!(task, dependency, "dependency added");
        }
        Ok(())
    }

    /// Direct dependencies of a task, in insertion order
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.dependencies
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All registered tasks, in registration order
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.order.iter().filter_map(|name| self.tasks.get(name))
    }

    /// Registered rules
    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is registered
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Errors while building or resolving the task graph
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A task name was registered twice
    #[error("Task '{0}' is already registered")]
    DuplicateTask(String),

    /// Two rules share a prefix
    #[error("A rule for prefix '{0}' is already registered")]
    DuplicateRule(String),

    /// Referenced task is not registered
    #[error("Task '{0}' is not registered")]
    UnknownTask(String),

    /// Name not registered and not claimed by any rule
    #[error("Task '{0}' not found and no rule matches it")]
    UnresolvedTask(String),

    /// A rule created a task under a different name than requested
    #[error("Rule for '{requested}' created task '{created}'")]
    RuleNameMismatch { requested: String, created: String },

    /// Cyclic dependency detected
    #[error("Cyclic dependency detected among tasks: {0}")]
    CyclicDependency(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::config::MatrixConfig;

    use crate::rule::TestTaskFactory;

    fn graph_with_rule() -> TaskGraph {
        let mut graph = TaskGraph::new();
        graph
            .add_rule(TaskRule::new(
                "testGradle",
                TestTaskFactory::from_config(&MatrixConfig::default()),
            ))
            .unwrap();
        graph
    }

    #[test]
    fn test_register_and_get() {
        let mut graph = TaskGraph::new();
        graph.register(Task::lifecycle("check")).unwrap();
        assert!(graph.contains("check"));
        assert_eq!(graph.len(), 1);
        assert!(graph.get("build").is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut graph = TaskGraph::new();
        graph.register(Task::lifecycle("check")).unwrap();
        assert!(matches!(
            graph.register(Task::lifecycle("check")),
            Err(GraphError::DuplicateTask(_))
        ));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut graph = graph_with_rule();
        let first = graph.resolve("testGradle5.6.4").unwrap().unwrap();
        let second = graph.resolve("testGradle5.6.4").unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_resolve_unclaimed_name() {
        let mut graph = graph_with_rule();
        assert!(graph.resolve("assemble").unwrap().is_none());
        assert!(graph.is_empty());
        assert!(matches!(
            graph.named("assemble"),
            Err(GraphError::UnresolvedTask(_))
        ));
    }

    #[test]
    fn test_registered_task_shadows_rule() {
        let mut graph = graph_with_rule();
        let manual = graph.register(Task::lifecycle("testGradleAll")).unwrap();
        let resolved = graph.resolve("testGradleAll").unwrap().unwrap();
        assert!(Arc::ptr_eq(&manual, &resolved));
        assert!(resolved.test_spec().is_none());
    }

    #[test]
    fn test_rule_name_mismatch() {
        let mut graph = TaskGraph::new();
        graph
            .add_rule(TaskRule::new("gen", |_: &TaskName, _: &str| {
                Task::lifecycle("other")
            }))
            .unwrap();
        assert!(matches!(
            graph.resolve("gen1"),
            Err(GraphError::RuleNameMismatch { .. })
        ));
    }

    #[test]
    fn test_depends_on() {
        let mut graph = graph_with_rule();
        graph.register(Task::lifecycle("check")).unwrap();
        graph.named("testGradle5.6.4").unwrap();

        graph.depends_on("check", "testGradle5.6.4").unwrap();
        graph.depends_on("check", "testGradle5.6.4").unwrap();

        assert_eq!(graph.dependencies_of("check").len(), 1);
        assert!(graph.dependencies_of("testGradle5.6.4").is_empty());
    }

    #[test]
    fn test_depends_on_unknown() {
        let mut graph = TaskGraph::new();
        graph.register(Task::lifecycle("check")).unwrap();
        assert!(matches!(
            graph.depends_on("check", "missing"),
            Err(GraphError::UnknownTask(_))
        ));
        assert!(matches!(
            graph.depends_on("missing", "check"),
            Err(GraphError::UnknownTask(_))
        ));
        assert!(matches!(
            graph.depends_on("check", "check"),
            Err(GraphError::CyclicDependency(_))
        ));
    }

    #[test]
    fn test_tasks_in_registration_order() {
        let mut graph = TaskGraph::new();
        for name in ["check", "build", "publish"] {
            graph.register(Task::lifecycle(name)).unwrap();
        }
        let names: Vec<&str> = graph.tasks().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["check", "build", "publish"]);
    }
}
