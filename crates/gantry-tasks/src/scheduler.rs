//! Task scheduler: async executor using tokio

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::Semaphore;

use crate::plan::ExecutionPlan;
use crate::predicate::FactSource;
use crate::reporter::{TaskEvent, TaskReporter};
use crate::task::{Task, TaskAction, TaskName};

/// Result of a single task execution
#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    /// Task that was executed
    pub name: TaskName,
    /// Outcome
    pub status: TaskStatus,
    /// How long the task took
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
    /// Captured stdout
    #[serde(skip)]
    pub stdout: String,
    /// Captured stderr
    #[serde(skip)]
    pub stderr: String,
}

impl TaskResult {
    fn new(name: &TaskName, status: TaskStatus, duration: Duration) -> Self {
        Self {
            name: name.clone(),
            status,
            duration,
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_millis())
}

/// Task execution status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task completed successfully
    Success,
    /// Task was skipped by its predicate or a dry run
    Skipped(String),
    /// Task failed
    Failed(String),
    /// Task was not started because of an earlier failure
    NotRun(String),
}

impl TaskStatus {
    /// Check if this status represents success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Check if this status represents a failure of the task itself
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Whether dependents may run after a dependency ended this way
    pub fn unblocks_dependents(&self) -> bool {
        matches!(self, Self::Success | Self::Skipped(_))
    }
}

/// Options for the task scheduler
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Maximum concurrent tasks
    pub concurrency: usize,
    /// Whether to continue on error
    pub continue_on_error: bool,
    /// Whether this is a dry run
    pub dry_run: bool,
    /// Working directory root
    pub root_dir: PathBuf,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            concurrency: num_cpus(),
            continue_on_error: false,
            dry_run: false,
            root_dir: std::env::current_dir().unwrap_or_default(),
        }
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Task scheduler: executes an execution plan with parallelism
pub struct TaskScheduler {
    options: SchedulerOptions,
    facts: Arc<dyn FactSource>,
    reporter: Arc<dyn TaskReporter>,
}

impl TaskScheduler {
    /// Create a new scheduler
    pub fn new(
        options: SchedulerOptions,
        facts: Arc<dyn FactSource>,
        reporter: Arc<dyn TaskReporter>,
    ) -> Self {
        Self {
            options,
            facts,
            reporter,
        }
    }

    /// Execute all tasks in the plan
    pub async fn execute(&self, plan: &ExecutionPlan) -> Vec<TaskResult> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut all_results: HashMap<TaskName, TaskResult> = HashMap::new();
        let mut failed = false;

        for (wave_idx, wave) in plan.waves().iter().enumerate() {
            if failed && !self.options.continue_on_error {
                for name in wave {
                    let reason = "build stopped after an earlier failure".to_string();
                    self.reporter.report(&TaskEvent::NotRun {
                        name: name.clone(),
                        reason: reason.clone(),
                    });
                    all_results.insert(
                        name.clone(),
                        TaskResult::new(name, TaskStatus::NotRun(reason), Duration::ZERO),
                    );
                }
                continue;
            }

            self.reporter.report(&TaskEvent::WaveStarted {
                wave: wave_idx,
                task_count: wave.len(),
            });

            let mut handles = Vec::new();

            for name in wave {
                let node = match plan.get(name) {
                    Some(n) => n,
                    None => continue,
                };

                let blocking = node.dependencies.iter().find(|dep| {
                    all_results
                        .get(*dep)
                        .is_some_and(|r| !r.status.unblocks_dependents())
                });
                if let Some(dep) = blocking {
                    let reason = format!("dependency {} did not succeed", dep);
                    self.reporter.report(&TaskEvent::NotRun {
                        name: name.clone(),
                        reason: reason.clone(),
                    });
                    all_results.insert(
                        name.clone(),
                        TaskResult::new(name, TaskStatus::NotRun(reason), Duration::ZERO),
                    );
                    continue;
                }

                let permit = semaphore.clone().acquire_owned().await.ok();
                let task = node.task.clone();
                let facts = self.facts.clone();
                let reporter = self.reporter.clone();
                let root_dir = self.options.root_dir.clone();
                let dry_run = self.options.dry_run;

                let handle = tokio::spawn(async move {
                    let result =
                        execute_task(&task, &*facts, &root_dir, dry_run, &*reporter).await;
                    drop(permit);
                    result
                });

                handles.push((name.clone(), handle));
            }

            for (name, handle) in handles {
                match handle.await {
                    Ok(result) => {
                        if result.status.is_failure() {
                            failed = true;
                        }
                        all_results.insert(name, result);
                    }
                    Err(e) => {
                        failed = true;
                        all_results.insert(
                            name.clone(),
                            TaskResult::new(
                                &name,
                                TaskStatus::Failed(format!("Task panicked: {}", e)),
                                Duration::ZERO,
                            ),
                        );
                    }
                }
            }
        }

        let count = |f: fn(&TaskStatus) -> bool| {
            all_results.values().filter(|r| f(&r.status)).count()
        };
        self.reporter.report(&TaskEvent::AllCompleted {
            total: all_results.len(),
            succeeded: count(TaskStatus::is_success),
            skipped: count(|s: &TaskStatus| matches!(s, TaskStatus::Skipped(_))),
            failed: count(TaskStatus::is_failure),
            duration: start.elapsed(),
        });

        // Return results in topological order
        plan.sorted()
            .iter()
            .filter_map(|name| all_results.remove(name))
            .collect()
    }
}

/// Execute a single task
async fn execute_task(
    task: &Task,
    facts: &dyn FactSource,
    root_dir: &Path,
    dry_run: bool,
    reporter: &dyn TaskReporter,
) -> TaskResult {
    let start = Instant::now();
    let name = &task.name;

    // Predicates see the facts as they are right now
    if let Some(predicate) = &task.only_if {
        if !predicate.should_run(facts) {
            let reason = predicate.skip_reason();
            reporter.report(&TaskEvent::Skipped {
                name: name.clone(),
                reason: reason.clone(),
            });
            return TaskResult::new(name, TaskStatus::Skipped(reason), start.elapsed());
        }
    }

    let command = match &task.action {
        TaskAction::Lifecycle => {
            reporter.report(&TaskEvent::Completed {
                name: name.clone(),
                duration: start.elapsed(),
            });
            return TaskResult::new(name, TaskStatus::Success, start.elapsed());
        }
        TaskAction::Test(spec) => spec.command.clone(),
        TaskAction::Shell(spec) => spec.command.clone(),
    };

    if dry_run {
        let reason = "dry run".to_string();
        reporter.report(&TaskEvent::Skipped {
            name: name.clone(),
            reason: reason.clone(),
        });
        return TaskResult::new(name, TaskStatus::Skipped(reason), start.elapsed());
    }

    reporter.report(&TaskEvent::Started {
        name: name.clone(),
        command: command.clone(),
    });

    let env = task.action.environment();
    let result = run_shell_command(name, &command, &env, root_dir, reporter).await;
    let duration = start.elapsed();

    match result {
        Ok((stdout, stderr)) => {
            reporter.report(&TaskEvent::Completed {
                name: name.clone(),
                duration,
            });
            TaskResult {
                name: name.clone(),
                status: TaskStatus::Success,
                duration,
                stdout,
                stderr,
            }
        }
        Err(e) => {
            reporter.report(&TaskEvent::Failed {
                name: name.clone(),
                duration,
                error: e.clone(),
            });
            TaskResult::new(name, TaskStatus::Failed(e), duration)
        }
    }
}

/// Run a shell command and capture output
async fn run_shell_command(
    name: &TaskName,
    cmd: &str,
    env: &BTreeMap<String, String>,
    root_dir: &Path,
    reporter: &dyn TaskReporter,
) -> Result<(String, String), String> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .envs(env)
        .current_dir(root_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn: {}", e))?;

    // Both pipes are drained concurrently; a full pipe blocks the child.
    let (stdout_lines, stderr_lines) = tokio::join!(
        read_lines(child.stdout.take(), name, false, reporter),
        read_lines(child.stderr.take(), name, true, reporter),
    );

    let status = child
        .wait()
        .await
        .map_err(|e| format!("Failed to wait: {}", e))?;

    if status.success() {
        Ok((stdout_lines.join("\n"), stderr_lines.join("\n")))
    } else {
        let code = status.code().unwrap_or(-1);
        Err(format!(
            "Command exited with code {}: {}",
            code,
            stderr_lines.join("\n")
        ))
    }
}

/// Collect a child stream line by line, forwarding each line to the reporter
async fn read_lines<R>(
    stream: Option<R>,
    name: &TaskName,
    is_stderr: bool,
    reporter: &dyn TaskReporter,
) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let mut collected = Vec::new();
    let Some(stream) = stream else {
        return collected;
    };

    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        reporter.report(&TaskEvent::Output {
            name: name.clone(),
            line: line.clone(),
            is_stderr,
        });
        collected.push(line);
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use gantry_core::config::ExceptionFormat;

    use crate::graph::TaskGraph;
    use crate::predicate::{CompatibilityPredicate, StaticFacts};
    use crate::reporter::CollectingReporter;
    use crate::task::{ShellSpec, TestSpec};

    fn shell(name: &str, cmd: &str) -> Task {
        Task::new(
            name,
            TaskAction::Shell(ShellSpec {
                command: cmd.to_string(),
                env: BTreeMap::new(),
            }),
        )
    }

    fn test_task(version: &str) -> Task {
        Task::new(
            format!("testGradle{}", version),
            TaskAction::Test(TestSpec {
                command: "echo \"$GRADLE_UNDER_TEST\"".to_string(),
                system_properties: BTreeMap::from([(
                    "gradle.under.test".to_string(),
                    version.to_string(),
                )]),
                include_categories: vec!["org.example.Marker".to_string()],
                exception_format: ExceptionFormat::Full,
            }),
        )
        .with_only_if(CompatibilityPredicate::new(version))
    }

    fn scheduler(
        spec: &str,
        options: SchedulerOptions,
    ) -> (TaskScheduler, Arc<CollectingReporter>) {
        let reporter = Arc::new(CollectingReporter::default());
        let scheduler = TaskScheduler::new(
            options,
            Arc::new(StaticFacts::new(spec)),
            reporter.clone(),
        );
        (scheduler, reporter)
    }

    fn status_of<'a>(results: &'a [TaskResult], name: &str) -> &'a TaskStatus {
        &results
            .iter()
            .find(|r| r.name.as_str() == name)
            .unwrap()
            .status
    }

    #[test]
    fn test_task_status_predicates() {
        assert!(TaskStatus::Success.is_success());
        assert!(!TaskStatus::Skipped("x".to_string()).is_success());
        assert!(TaskStatus::Skipped("x".to_string()).unblocks_dependents());
        assert!(TaskStatus::Failed("error".to_string()).is_failure());
        assert!(!TaskStatus::NotRun("x".to_string()).unblocks_dependents());
        assert!(!TaskStatus::NotRun("x".to_string()).is_failure());
    }

    #[test]
    fn test_scheduler_options_default() {
        let opts = SchedulerOptions::default();
        assert!(opts.concurrency > 0);
        assert!(!opts.continue_on_error);
        assert!(!opts.dry_run);
    }

    #[tokio::test]
    async fn test_execute_dry_run() {
        let mut graph = TaskGraph::new();
        graph.register(shell("compile", "echo hello")).unwrap();
        let plan = ExecutionPlan::build(&graph, &[TaskName::from("compile")]).unwrap();

        let (scheduler, _) = scheduler(
            "11",
            SchedulerOptions {
                dry_run: true,
                ..Default::default()
            },
        );
        let results = scheduler.execute(&plan).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, TaskStatus::Skipped("dry run".to_string()));
    }

    #[tokio::test]
    async fn test_predicate_skip_does_not_fail_checkpoint() {
        let mut graph = TaskGraph::new();
        graph.register(Task::lifecycle("check")).unwrap();
        graph.register(test_task("4.10.3")).unwrap();
        graph.register(test_task("5.6.4")).unwrap();
        graph.depends_on("check", "testGradle4.10.3").unwrap();
        graph.depends_on("check", "testGradle5.6.4").unwrap();
        let plan = ExecutionPlan::build(&graph, &[TaskName::from("check")]).unwrap();

        let (scheduler, reporter) = scheduler("11", SchedulerOptions::default());
        let results = scheduler.execute(&plan).await;

        assert!(matches!(
            status_of(&results, "testGradle4.10.3"),
            TaskStatus::Skipped(_)
        ));
        assert_eq!(status_of(&results, "testGradle5.6.4"), &TaskStatus::Success);
        assert_eq!(status_of(&results, "check"), &TaskStatus::Success);

        let output = results
            .iter()
            .find(|r| r.name.as_str() == "testGradle5.6.4")
            .map(|r| r.stdout.clone())
            .unwrap();
        assert_eq!(output, "5.6.4");

        let skipped = reporter
            .events()
            .iter()
            .filter(|e| matches!(e, TaskEvent::Skipped { .. }))
            .count();
        assert_eq!(skipped, 1);
    }

    #[tokio::test]
    async fn test_legacy_family_runs_on_legacy_spec() {
        let mut graph = TaskGraph::new();
        graph.register(test_task("4.10.3")).unwrap();
        let plan = ExecutionPlan::build(&graph, &[TaskName::from("testGradle4.10.3")]).unwrap();

        let (scheduler, _) = scheduler("1.8", SchedulerOptions::default());
        let results = scheduler.execute(&plan).await;
        assert_eq!(results[0].status, TaskStatus::Success);
        assert_eq!(results[0].stdout, "4.10.3");
    }

    #[tokio::test]
    async fn test_failure_blocks_dependents() {
        let mut graph = TaskGraph::new();
        graph.register(shell("broken", "exit 3")).unwrap();
        graph.register(shell("fine", "true")).unwrap();
        graph.register(Task::lifecycle("check")).unwrap();
        graph.depends_on("check", "broken").unwrap();
        graph.depends_on("check", "fine").unwrap();
        let plan = ExecutionPlan::build(&graph, &[TaskName::from("check")]).unwrap();

        let (scheduler, _) = scheduler(
            "11",
            SchedulerOptions {
                continue_on_error: true,
                ..Default::default()
            },
        );
        let results = scheduler.execute(&plan).await;

        assert!(status_of(&results, "broken").is_failure());
        assert_eq!(status_of(&results, "fine"), &TaskStatus::Success);
        assert!(matches!(status_of(&results, "check"), TaskStatus::NotRun(_)));
    }

    #[tokio::test]
    async fn test_stop_after_failure() {
        let mut graph = TaskGraph::new();
        graph.register(shell("broken", "exit 1")).unwrap();
        graph.register(shell("after", "true")).unwrap();
        graph.depends_on("after", "broken").unwrap();
        let plan = ExecutionPlan::build(&graph, &[TaskName::from("after")]).unwrap();

        let (scheduler, _) = scheduler("11", SchedulerOptions::default());
        let results = scheduler.execute(&plan).await;

        assert_eq!(results.len(), 2);
        assert!(matches!(status_of(&results, "after"), TaskStatus::NotRun(_)));
    }

    #[tokio::test]
    async fn test_large_stderr_does_not_stall() {
        let mut graph = TaskGraph::new();
        graph
            .register(shell(
                "noisy",
                "head -c 200000 /dev/zero | tr '\\0' x >&2; echo done",
            ))
            .unwrap();
        let plan = ExecutionPlan::build(&graph, &[TaskName::from("noisy")]).unwrap();

        let (scheduler, _) = scheduler("11", SchedulerOptions::default());
        let results = tokio::time::timeout(Duration::from_secs(10), scheduler.execute(&plan))
            .await
            .expect("task writing 200KB to stderr did not finish");

        assert_eq!(results[0].status, TaskStatus::Success);
        assert_eq!(results[0].stdout, "done");
        assert_eq!(results[0].stderr.len(), 200_000);
    }

    #[test]
    fn test_result_serializes_status() {
        let result = TaskResult::new(
            &TaskName::from("testGradle4.10.3"),
            TaskStatus::Skipped("dry run".to_string()),
            Duration::from_millis(12),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["name"], "testGradle4.10.3");
        assert_eq!(json["status"]["status"], "skipped");
        assert_eq!(json["status"]["reason"], "dry run");
        assert_eq!(json["duration_ms"], 12);
    }
}
