//! Version matrix registration

use std::sync::Arc;

use tracing::{info, instrument};

use crate::graph::{GraphError, TaskGraph};
use crate::task::{Task, TaskName};

/// Fans a fixed list of versions out into one rule-generated task each and
/// wires them into a checkpoint task
#[derive(Debug, Clone)]
pub struct MatrixRegistrar {
    prefix: String,
    entries: Vec<String>,
}

impl MatrixRegistrar {
    /// Registrar for `entries`, requested as `<prefix><entry>`
    pub fn new(prefix: impl Into<String>, entries: Vec<String>) -> Self {
        Self {
            prefix: prefix.into(),
            entries,
        }
    }

    /// Matrix entries, in order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Task names requested for the entries, in order
    pub fn task_names(&self) -> Vec<TaskName> {
        self.entries
            .iter()
            .map(|entry| TaskName::new(format!("{}{}", self.prefix, entry)))
            .collect()
    }

    /// Resolve every entry's task and make `checkpoint` depend on it.
    ///
    /// The checkpoint must already be registered. An entry no rule can
    /// resolve aborts registration.
    #[instrument(skip(self, graph), fields(entries = self.entries.len()))]
    pub fn register(
        &self,
        graph: &mut TaskGraph,
        checkpoint: &str,
    ) -> Result<Vec<Arc<Task>>, GraphError> {
        if !graph.contains(checkpoint) {
            return Err(GraphError::UnknownTask(checkpoint.to_string()));
        }

        let mut tasks = Vec::with_capacity(self.entries.len());
        for name in self.task_names() {
            let task = graph.named(name.as_str())?;
            graph.depends_on(checkpoint, name.as_str())?;
            tasks.push(task);
        }

        info!(checkpoint, tasks = tasks.len(), "version matrix registered");
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::config::MatrixConfig;

    use crate::rule::{TaskRule, TestTaskFactory};

    fn graph() -> TaskGraph {
        let mut graph = TaskGraph::new();
        graph.register(Task::lifecycle("check")).unwrap();
        graph
            .add_rule(TaskRule::new(
                "testGradle",
                TestTaskFactory::from_config(&MatrixConfig::default()),
            ))
            .unwrap();
        graph
    }

    fn registrar() -> MatrixRegistrar {
        MatrixRegistrar::new("testGradle", vec!["4.10.3".to_string(), "5.6.4".to_string()])
    }

    #[test]
    fn test_two_edges_into_checkpoint() {
        let mut graph = graph();
        let tasks = registrar().register(&mut graph, "check").unwrap();

        assert_eq!(tasks.len(), 2);
        let deps: Vec<&str> = graph
            .dependencies_of("check")
            .iter()
            .map(TaskName::as_str)
            .collect();
        assert_eq!(deps, vec!["testGradle4.10.3", "testGradle5.6.4"]);
    }

    #[test]
    fn test_registered_tasks_match_resolution() {
        let mut graph = graph();
        let tasks = registrar().register(&mut graph, "check").unwrap();
        let again = graph.resolve("testGradle5.6.4").unwrap().unwrap();
        assert!(Arc::ptr_eq(&tasks[1], &again));
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_registering_twice_adds_no_edges() {
        let mut graph = graph();
        registrar().register(&mut graph, "check").unwrap();
        registrar().register(&mut graph, "check").unwrap();
        assert_eq!(graph.dependencies_of("check").len(), 2);
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_missing_checkpoint() {
        let mut graph = TaskGraph::new();
        assert!(matches!(
            registrar().register(&mut graph, "check"),
            Err(GraphError::UnknownTask(_))
        ));
    }

    #[test]
    fn test_entry_without_rule_fails_fast() {
        let mut graph = TaskGraph::new();
        graph.register(Task::lifecycle("check")).unwrap();
        assert!(matches!(
            registrar().register(&mut graph, "check"),
            Err(GraphError::UnresolvedTask(_))
        ));
    }

    #[test]
    fn test_task_names() {
        let names = registrar().task_names();
        assert_eq!(names[0].as_str(), "testGradle4.10.3");
        assert_eq!(names[1].as_str(), "testGradle5.6.4");
    }
}
