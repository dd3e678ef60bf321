//! Gantry Tasks - Task graph, name rules and execution
//!
//! Tasks are registered into a [`TaskGraph`], either explicitly or on demand
//! through a [`TaskRule`] that claims every name starting with its prefix.
//! The [`MatrixRegistrar`] requests one rule-generated task per configured
//! version and wires them into a checkpoint. [`ExecutionPlan`] orders the
//! requested tasks into waves and [`TaskScheduler`] runs them, evaluating
//! each task's predicate right before it would start.

pub mod graph;
pub mod matrix;
pub mod plan;
pub mod predicate;
pub mod project;
pub mod reporter;
pub mod rule;
pub mod scheduler;
pub mod task;

pub use graph::{GraphError, TaskGraph};
pub use matrix::MatrixRegistrar;
pub use plan::{ExecutionPlan, PlanNode};
pub use predicate::{
    CompatibilityPredicate, EnvFactSource, FactSource, OnlyIf, SigningPredicate, StaticFacts,
};
pub use project::{configure, ConfigureError, ConfiguredProject};
pub use reporter::{TaskEvent, TaskReporter, TaskReporterRegistry};
pub use rule::{NameMatcher, RuleRegistry, TaskFactory, TaskRule, TestTaskFactory};
pub use scheduler::{SchedulerOptions, TaskResult, TaskScheduler, TaskStatus};
pub use task::{ShellSpec, Task, TaskAction, TaskName, TestSpec};
