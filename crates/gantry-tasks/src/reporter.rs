//! Task execution reporting

use std::sync::Arc;
use std::time::Duration;

use crate::task::TaskName;

/// Events emitted during task execution
#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// A task is starting execution
    Started {
        name: TaskName,
        command: String,
    },
    /// A task produced output
    Output {
        name: TaskName,
        line: String,
        is_stderr: bool,
    },
    /// A task completed successfully
    Completed {
        name: TaskName,
        duration: Duration,
    },
    /// A task failed
    Failed {
        name: TaskName,
        duration: Duration,
        error: String,
    },
    /// A task's predicate was false or the run is a dry run
    Skipped {
        name: TaskName,
        reason: String,
    },
    /// A task did not run because of an earlier failure
    NotRun {
        name: TaskName,
        reason: String,
    },
    /// An execution wave is starting
    WaveStarted {
        wave: usize,
        task_count: usize,
    },
    /// All tasks completed
    AllCompleted {
        total: usize,
        succeeded: usize,
        skipped: usize,
        failed: usize,
        duration: Duration,
    },
}

/// Trait for reporting task execution progress
pub trait TaskReporter: Send + Sync {
    /// Handle a task event
    fn report(&self, event: &TaskEvent);
}

/// Simple reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl TaskReporter for TracingReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::Started { name, command } => {
                tracing::info!("Starting {}: {}", name, command);
            }
            TaskEvent::Output {
                name,
                line,
                is_stderr,
            } => {
                if *is_stderr {
                    tracing::warn!("[{}] {}", name, line);
                } else {
                    tracing::debug!("[{}] {}", name, line);
                }
            }
            TaskEvent::Completed { name, duration } => {
                tracing::info!("{} completed in {:.1}s", name, duration.as_secs_f64());
            }
            TaskEvent::Failed {
                name,
                duration,
                error,
            } => {
                tracing::error!(
                    "{} failed after {:.1}s: {}",
                    name,
                    duration.as_secs_f64(),
                    error
                );
            }
            TaskEvent::Skipped { name, reason } => {
                tracing::info!("{} skipped: {}", name, reason);
            }
            TaskEvent::NotRun { name, reason } => {
                tracing::warn!("{} not run: {}", name, reason);
            }
            TaskEvent::WaveStarted { wave, task_count } => {
                tracing::info!("Starting wave {} ({} tasks)", wave, task_count);
            }
            TaskEvent::AllCompleted {
                total,
                succeeded,
                skipped,
                failed,
                duration,
            } => {
                tracing::info!(
                    "All tasks complete: {}/{} succeeded, {} skipped, {} failed ({:.1}s)",
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

/// Reporter that collects events for later inspection (useful for testing)
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: std::sync::Mutex<Vec<TaskEvent>>,
}

impl CollectingReporter {
    /// Get all collected events
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl TaskReporter for CollectingReporter {
    fn report(&self, event: &TaskEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Fans events out to several reporters
#[derive(Default)]
pub struct TaskReporterRegistry {
    reporters: Vec<Arc<dyn TaskReporter>>,
}

impl TaskReporterRegistry {
    /// Registry with no reporters
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a reporter
    pub fn register(&mut self, reporter: Arc<dyn TaskReporter>) {
        self.reporters.push(reporter);
    }

    /// Registered reporters
    pub fn all(&self) -> &[Arc<dyn TaskReporter>] {
        &self.reporters
    }
}

impl TaskReporter for TaskReporterRegistry {
    fn report(&self, event: &TaskEvent) {
        for reporter in &self.reporters {
            reporter.report(event);
        }
    }
}
