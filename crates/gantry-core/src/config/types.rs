//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::version::UNSPECIFIED_VERSION;

/// Main configuration for Gantry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project name
    pub name: Option<String>,

    /// Project group (e.g. "org.jenkins-ci.tools")
    pub group: Option<String>,

    /// Artifact version string
    pub version: String,

    /// Compatibility matrix configuration
    pub matrix: MatrixConfig,

    /// Platform facts overrides
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Publishing configuration
    pub publish: PublishConfig,

    /// Signing configuration
    #[serde(default)]
    pub signing: SigningConfig,

    /// Task execution configuration
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Free-form project properties (lowest precedence)
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: None,
            group: None,
            version: UNSPECIFIED_VERSION.to_string(),
            matrix: MatrixConfig::default(),
            platform: PlatformConfig::default(),
            publish: PublishConfig::default(),
            signing: SigningConfig::default(),
            tasks: TasksConfig::default(),
            properties: BTreeMap::new(),
        }
    }
}

/// Version compatibility matrix configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Literal task-name prefix claimed by the test rule
    pub prefix: String,

    /// Ordered matrix entries wired into the checkpoint task
    pub versions: Vec<String>,

    /// System property carrying the version under test
    pub system_property: String,

    /// Marker category the generated test tasks are restricted to
    pub category: String,

    /// Command that runs the test suite
    pub test_command: String,

    /// Aggregate checkpoint task name
    pub checkpoint: String,

    /// How test failures are rendered
    pub exception_format: ExceptionFormat,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            prefix: "testGradle".to_string(),
            versions: vec!["4.10.3".to_string(), "5.6.4".to_string()],
            system_property: "gradle.under.test".to_string(),
            category: "org.jenkinsci.gradle.plugins.jpi.UsesGradleTestKit".to_string(),
            test_command: "./gradlew test".to_string(),
            checkpoint: "check".to_string(),
            exception_format: ExceptionFormat::Full,
        }
    }
}

/// Rendering of test exceptions in test output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExceptionFormat {
    /// Only the exception message
    Short,
    /// Full stack traces
    #[default]
    Full,
}

impl ExceptionFormat {
    /// Value exported to the test process
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Full => "full",
        }
    }
}

/// Platform facts configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Fixed language-specification version, overriding the environment
    pub spec_version: Option<String>,
}

/// Publishing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Repository name used in task names and reports
    pub repository_name: String,

    /// Repository base URL; the target path is appended to it
    pub base_url: String,

    /// Version suffix marking a pre-release
    pub snapshot_suffix: String,

    /// Publication name used in task names
    pub publication: String,

    /// Command that uploads the publication
    pub command: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            repository_name: "JenkinsCommunity".to_string(),
            base_url: "https://repo.jenkins-ci.org".to_string(),
            snapshot_suffix: "SNAPSHOT".to_string(),
            publication: "pluginMaven".to_string(),
            command: None,
        }
    }
}

/// Signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Project property holding the repository username
    pub username_property: String,

    /// Project property holding the repository password
    pub password_property: String,

    /// Command that signs the publication
    pub command: Option<String>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            username_property: "jenkins.username".to_string(),
            password_property: "jenkins.password".to_string(),
            command: None,
        }
    }
}

/// Task execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// Maximum concurrent tasks
    pub concurrency: usize,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}
