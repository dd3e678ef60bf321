//! Execution plan: the requested tasks plus everything they depend on

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use tracing::{info, instrument};

use crate::graph::{GraphError, TaskGraph};
use crate::task::{Task, TaskName};

/// A task scheduled for execution
#[derive(Debug, Clone)]
pub struct PlanNode {
    /// The task
    pub task: Arc<Task>,
    /// Tasks that must finish before this one
    pub dependencies: BTreeSet<TaskName>,
    /// Tasks waiting on this one
    pub dependents: BTreeSet<TaskName>,
    /// Execution wave (tasks in the same wave can run in parallel)
    pub wave: usize,
}

/// Ordered execution plan
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// All nodes in the plan
    nodes: BTreeMap<TaskName, PlanNode>,
    /// Tasks grouped by execution wave (wave 0 runs first)
    waves: Vec<Vec<TaskName>>,
    /// Topologically sorted task order
    sorted_order: Vec<TaskName>,
}

impl ExecutionPlan {
    /// Build a plan for `requested` and their transitive dependencies.
    ///
    /// Every requested name must already be registered in `graph`.
    #[instrument(skip_all, fields(requested = requested.len()))]
    pub fn build(graph: &TaskGraph, requested: &[TaskName]) -> Result<Self, GraphError> {
        let mut nodes: BTreeMap<TaskName, PlanNode> = BTreeMap::new();
        let mut queue: VecDeque<TaskName> = requested.iter().cloned().collect();

        while let Some(name) = queue.pop_front() {
            if nodes.contains_key(&name) {
                continue;
            }
            let task = graph
                .get(name.as_str())
                .ok_or_else(|| GraphError::UnknownTask(name.to_string()))?;
            let dependencies: BTreeSet<TaskName> =
                graph.dependencies_of(name.as_str()).iter().cloned().collect();
            queue.extend(dependencies.iter().cloned());

            nodes.insert(
                name,
                PlanNode {
                    task,
                    dependencies,
                    dependents: BTreeSet::new(),
                    wave: 0,
                },
            );
        }

        // Build reverse dependency map (dependents)
        let all_deps: Vec<(TaskName, BTreeSet<TaskName>)> = nodes
            .iter()
            .map(|(name, node)| (name.clone(), node.dependencies.clone()))
            .collect();

        for (name, deps) in &all_deps {
            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(dep) {
                    dep_node.dependents.insert(name.clone());
                }
            }
        }

        let sorted_order = Self::topological_sort(&nodes)?;
        let waves = Self::compute_waves(&nodes, &sorted_order);

        for (wave_idx, wave_tasks) in waves.iter().enumerate() {
            for name in wave_tasks {
                if let Some(node) = nodes.get_mut(name) {
                    node.wave = wave_idx;
                }
            }
        }

        info!(
            task_count = nodes.len(),
            wave_count = waves.len(),
            "execution plan built"
        );

        Ok(Self {
            nodes,
            waves,
            sorted_order,
        })
    }

    /// Topological sort using Kahn's algorithm
    fn topological_sort(
        nodes: &BTreeMap<TaskName, PlanNode>,
    ) -> Result<Vec<TaskName>, GraphError> {
        let mut in_degree: BTreeMap<&TaskName, usize> = BTreeMap::new();
        let mut queue: VecDeque<TaskName> = VecDeque::new();
        let mut sorted: Vec<TaskName> = Vec::new();

        for (name, node) in nodes {
            let degree = node.dependencies.len();
            in_degree.insert(name, degree);
            if degree == 0 {
                queue.push_back(name.clone());
            }
        }

        while let Some(name) = queue.pop_front() {
            if let Some(node) = nodes.get(&name) {
                for dependent in &node.dependents {
                    if let Some(degree) = in_degree.get_mut(dependent) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            queue.push_back(dependent.clone());
                        }
                    }
                }
            }
            sorted.push(name);
        }

        if sorted.len() != nodes.len() {
            let in_sorted: BTreeSet<_> = sorted.iter().collect();
            let cyclic: Vec<String> = nodes
                .keys()
                .filter(|name| !in_sorted.contains(name))
                .map(|name| name.to_string())
                .collect();
            return Err(GraphError::CyclicDependency(cyclic.join(", ")));
        }

        Ok(sorted)
    }

    /// Compute execution waves (groups of tasks that can run in parallel)
    fn compute_waves(
        nodes: &BTreeMap<TaskName, PlanNode>,
        sorted: &[TaskName],
    ) -> Vec<Vec<TaskName>> {
        let mut wave_map: BTreeMap<&TaskName, usize> = BTreeMap::new();

        for name in sorted {
            if let Some(node) = nodes.get(name) {
                let wave = node
                    .dependencies
                    .iter()
                    .filter_map(|dep| wave_map.get(dep))
                    .max()
                    .map(|w| w + 1)
                    .unwrap_or(0);
                wave_map.insert(name, wave);
            }
        }

        let max_wave = wave_map.values().max().copied().unwrap_or(0);
        let mut waves: Vec<Vec<TaskName>> = vec![Vec::new(); max_wave + 1];

        for name in sorted {
            if let Some(&wave) = wave_map.get(name) {
                waves[wave].push(name.clone());
            }
        }

        waves.retain(|wave| !wave.is_empty());
        waves
    }

    /// Get a specific node
    pub fn get(&self, name: &TaskName) -> Option<&PlanNode> {
        self.nodes.get(name)
    }

    /// Get execution waves
    pub fn waves(&self) -> &[Vec<TaskName>] {
        &self.waves
    }

    /// Get the total number of tasks
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the plan is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get topologically sorted order
    pub fn sorted(&self) -> &[TaskName] {
        &self.sorted_order
    }

    /// Get a human-readable summary of the execution plan
    pub fn describe(&self) -> String {
        let mut plan = String::new();
        for (i, wave) in self.waves.iter().enumerate() {
            plan.push_str(&format!("Wave {} ({} tasks):\n", i, wave.len()));
            for name in wave {
                if let Some(node) = self.nodes.get(name) {
                    let cmd = node.task.action.command().unwrap_or("<lifecycle>");
                    let deps: Vec<String> =
                        node.dependencies.iter().map(|d| d.to_string()).collect();
                    if deps.is_empty() {
                        plan.push_str(&format!("  {} -> {}\n", name, cmd));
                    } else {
                        plan.push_str(&format!(
                            "  {} -> {} (after: {})\n",
                            name,
                            cmd,
                            deps.join(", ")
                        ));
                    }
                }
            }
        }
        plan
    }
}
