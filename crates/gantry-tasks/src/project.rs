//! Configuration phase: builds the task graph for a project

use std::collections::BTreeMap;

use gantry_core::config::Config;
use gantry_core::{GantryError, ProjectProperties, PublishPlan};
use tracing::{info, instrument};

use crate::graph::{GraphError, TaskGraph};
use crate::matrix::MatrixRegistrar;
use crate::predicate::SigningPredicate;
use crate::rule::{TaskRule, TestTaskFactory};
use crate::task::{ShellSpec, Task, TaskAction};

/// Lifecycle task that depends on the verification checkpoint
pub const BUILD_TASK: &str = "build";

/// Lifecycle task that depends on the repository upload
pub const PUBLISH_TASK: &str = "publish";

/// A fully configured project, ready for planning
#[derive(Debug)]
pub struct ConfiguredProject {
    /// Registered tasks, rules and edges
    pub graph: TaskGraph,
    /// Publication decisions made during configuration
    pub publish: PublishPlan,
    /// Name of the verification checkpoint
    pub checkpoint: String,
}

/// Errors raised while configuring a project
#[derive(Debug, thiserror::Error)]
pub enum ConfigureError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Core(#[from] GantryError),

    /// Complete credentials make signing mandatory but nothing can sign
    #[error("Signing is required for '{task}' but no [signing] command is configured")]
    MissingSigningCommand { task: String },
}

/// Register the lifecycle tasks, the version rule and matrix, and the publish
/// task family.
#[instrument(skip_all, fields(version = %config.version))]
pub fn configure(
    config: &Config,
    props: &ProjectProperties,
) -> Result<ConfiguredProject, ConfigureError> {
    let mut graph = TaskGraph::new();
    let matrix = &config.matrix;

    graph.register(
        Task::lifecycle(matrix.checkpoint.as_str())
            .with_group("verification")
            .with_description("Runs all checks"),
    )?;
    graph.register(
        Task::lifecycle(BUILD_TASK)
            .with_group("build")
            .with_description("Assembles and tests this project"),
    )?;
    graph.depends_on(BUILD_TASK, &matrix.checkpoint)?;

    graph.add_rule(TaskRule::new(
        matrix.prefix.as_str(),
        TestTaskFactory::from_config(matrix),
    ))?;
    MatrixRegistrar::new(matrix.prefix.as_str(), matrix.versions.clone())
        .register(&mut graph, &matrix.checkpoint)?;

    let publish = PublishPlan::resolve(config, props)?;
    register_publish_tasks(&mut graph, config, &publish)?;

    info!(tasks = graph.len(), "project configured");
    Ok(ConfiguredProject {
        graph,
        publish,
        checkpoint: matrix.checkpoint.clone(),
    })
}

fn register_publish_tasks(
    graph: &mut TaskGraph,
    config: &Config,
    plan: &PublishPlan,
) -> Result<(), ConfigureError> {
    let sign = plan.sign_task_name();
    if plan.signing.is_required() && config.signing.command.is_none() {
        return Err(ConfigureError::MissingSigningCommand { task: sign });
    }

    let env = publish_environment(plan);
    let action = |command: &Option<String>| match command {
        Some(command) => TaskAction::Shell(ShellSpec {
            command: command.clone(),
            env: env.clone(),
        }),
        None => TaskAction::Lifecycle,
    };

    graph.register(
        Task::new(sign.as_str(), action(&config.signing.command))
            .with_group("publishing")
            .with_description(format!("Signs the {} publication", plan.publication))
            .with_only_if(SigningPredicate::new(plan.signing.is_required())),
    )?;

    let upload = plan.publish_task_name();
    graph.register(
        Task::new(upload.as_str(), action(&config.publish.command))
            .with_group("publishing")
            .with_description(format!(
                "Publishes the {} publication to the {} repository",
                plan.publication, plan.repository.name
            )),
    )?;
    graph.depends_on(&upload, &sign)?;

    graph.register(
        Task::lifecycle(PUBLISH_TASK)
            .with_group("publishing")
            .with_description("Publishes all publications"),
    )?;
    graph.depends_on(PUBLISH_TASK, &upload)?;
    Ok(())
}

/// Environment handed to the sign and upload commands
fn publish_environment(plan: &PublishPlan) -> BTreeMap<String, String> {
    let mut env = BTreeMap::from([
        (
            "PUBLISH_REPOSITORY_NAME".to_string(),
            plan.repository.name.clone(),
        ),
        (
            "PUBLISH_REPOSITORY_URL".to_string(),
            plan.repository.url.to_string(),
        ),
        ("PUBLISH_TARGET".to_string(), plan.target.to_string()),
        ("PROJECT_VERSION".to_string(), plan.version.clone()),
    ]);
    let credentials = &plan.repository.credentials;
    if let Some(username) = &credentials.username {
        env.insert("PUBLISH_USERNAME".to_string(), username.clone());
    }
    if let Some(password) = &credentials.password {
        env.insert("PUBLISH_PASSWORD".to_string(), password.clone());
    }
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use gantry_core::PublishTarget;

    use crate::plan::ExecutionPlan;
    use crate::predicate::StaticFacts;
    use crate::reporter::CollectingReporter;
    use crate::scheduler::{SchedulerOptions, TaskScheduler, TaskStatus};
    use crate::task::TaskName;

    fn credentials() -> ProjectProperties {
        let mut props = ProjectProperties::new();
        props.set("jenkins.username", "ci");
        props.set("jenkins.password", "secret");
        props
    }

    #[test]
    fn test_configure_defaults() {
        let project = configure(&Config::default(), &ProjectProperties::new()).unwrap();
        let graph = &project.graph;

        let names: Vec<&str> = graph.tasks().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "check",
                "build",
                "testGradle4.10.3",
                "testGradle5.6.4",
                "signPluginMavenPublication",
                "publishPluginMavenPublicationToJenkinsCommunityRepository",
                "publish",
            ]
        );
        assert_eq!(graph.dependencies_of("build")[0].as_str(), "check");
        assert_eq!(graph.dependencies_of("check").len(), 2);
        assert_eq!(graph.rules().len(), 1);
    }

    #[test]
    fn test_publish_plan_follows_version() {
        let mut config = Config::default();
        config.version = "1.2.3".to_string();
        let project = configure(&config, &ProjectProperties::new()).unwrap();
        assert_eq!(project.publish.target, PublishTarget::Releases);
        assert_eq!(
            project.publish.repository.url.as_str(),
            "https://repo.jenkins-ci.org/releases"
        );

        config.version = "1.2.3-SNAPSHOT".to_string();
        let project = configure(&config, &ProjectProperties::new()).unwrap();
        assert_eq!(project.publish.target, PublishTarget::Snapshots);
    }

    #[test]
    fn test_publish_environment_includes_credentials() {
        let mut config = Config::default();
        config.version = "2.0".to_string();
        config.signing.command = Some("./sign.sh".to_string());
        config.publish.command = Some("./upload.sh".to_string());
        let project = configure(&config, &credentials()).unwrap();

        let upload = project.graph.get(&project.publish.publish_task_name()).unwrap();
        let env = upload.action.environment();
        assert_eq!(env["PUBLISH_TARGET"], "releases");
        assert_eq!(env["PUBLISH_USERNAME"], "ci");
        assert_eq!(env["PUBLISH_PASSWORD"], "secret");
        assert_eq!(env["PROJECT_VERSION"], "2.0");
        assert_eq!(env["PUBLISH_REPOSITORY_NAME"], "JenkinsCommunity");
    }

    #[test]
    fn test_required_signing_without_command_rejected() {
        let err = configure(&Config::default(), &credentials()).unwrap_err();
        match err {
            ConfigureError::MissingSigningCommand { task } => {
                assert_eq!(task, "signPluginMavenPublication")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_required_signing_with_command_registers_shell_task() {
        let mut config = Config::default();
        config.signing.command = Some("./sign.sh".to_string());
        let project = configure(&config, &credentials()).unwrap();

        let sign = project.graph.get("signPluginMavenPublication").unwrap();
        assert_eq!(sign.action.command(), Some("./sign.sh"));
        assert!(sign.only_if.as_ref().unwrap().should_run(&StaticFacts::unknown()));
    }

    #[test]
    fn test_unconfigured_commands_are_lifecycle() {
        let project = configure(&Config::default(), &ProjectProperties::new()).unwrap();
        let sign = project.graph.get("signPluginMavenPublication").unwrap();
        assert!(sign.action.command().is_none());
        assert!(sign.only_if.is_some());
    }

    #[test]
    fn test_checkpoint_name_clash_rejected() {
        let mut config = Config::default();
        config.matrix.checkpoint = "build".to_string();
        assert!(matches!(
            configure(&config, &ProjectProperties::new()),
            Err(ConfigureError::Graph(GraphError::DuplicateTask(_)))
        ));
    }

    #[tokio::test]
    async fn test_requested_matrix_task_runs_on_modern_spec() {
        let mut config = Config::default();
        config.matrix.test_command =
            "echo \"$GRADLE_UNDER_TEST $TEST_INCLUDE_CATEGORIES\"".to_string();
        let mut project = configure(&config, &ProjectProperties::new()).unwrap();

        let task = project.graph.named("testGradle5.6.4").unwrap();
        let spec = task.test_spec().unwrap();
        assert_eq!(spec.system_properties["gradle.under.test"], "5.6.4");
        assert_eq!(
            spec.include_categories,
            vec!["org.jenkinsci.gradle.plugins.jpi.UsesGradleTestKit".to_string()]
        );

        let plan = ExecutionPlan::build(&project.graph, &[TaskName::from("testGradle5.6.4")])
            .unwrap();
        let reporter = Arc::new(CollectingReporter::default());
        let scheduler = TaskScheduler::new(
            SchedulerOptions::default(),
            Arc::new(StaticFacts::new("11")),
            reporter,
        );
        let results = scheduler.execute(&plan).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, TaskStatus::Success);
        assert_eq!(
            results[0].stdout,
            "5.6.4 org.jenkinsci.gradle.plugins.jpi.UsesGradleTestKit"
        );
    }

    #[tokio::test]
    async fn test_publish_without_credentials_skips_signing() {
        let project = configure(&Config::default(), &ProjectProperties::new()).unwrap();
        let plan =
            ExecutionPlan::build(&project.graph, &[TaskName::from(PUBLISH_TASK)]).unwrap();
        let scheduler = TaskScheduler::new(
            SchedulerOptions::default(),
            Arc::new(StaticFacts::unknown()),
            Arc::new(CollectingReporter::default()),
        );
        let results = scheduler.execute(&plan).await;

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].status,
            TaskStatus::Skipped("signing not required".to_string())
        );
        assert!(results[1..].iter().all(|r| r.status.is_success()));
    }
}
