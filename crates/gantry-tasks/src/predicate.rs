//! Execution predicates
//!
//! A predicate is attached to a task at configuration time but only evaluated
//! by the scheduler immediately before the task would start. Platform facts
//! are read through a [`FactSource`] at that moment, never cached at
//! configuration time.

use std::fmt;

/// Environment variable reporting the platform language-specification version
pub const SPEC_VERSION_ENV: &str = "JAVA_SPECIFICATION_VERSION";

/// Spec version the 4.x family is restricted to
pub const LEGACY_SPEC_VERSION: &str = "1.8";

/// Source of platform facts, queried at execution time
pub trait FactSource: Send + Sync {
    /// The declared language-specification version, if known
    fn spec_version(&self) -> Option<String>;
}

/// Reads facts from the process environment on every query
#[derive(Debug, Clone, Default)]
pub struct EnvFactSource {
    spec_version_override: Option<String>,
}

impl EnvFactSource {
    /// Create a source reading [`SPEC_VERSION_ENV`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed spec version instead of the environment
    pub fn with_spec_version(mut self, version: Option<String>) -> Self {
        self.spec_version_override = version;
        self
    }
}

impl FactSource for EnvFactSource {
    fn spec_version(&self) -> Option<String> {
        self.spec_version_override
            .clone()
            .or_else(|| std::env::var(SPEC_VERSION_ENV).ok())
    }
}

/// Fixed facts
#[derive(Debug, Clone, Default)]
pub struct StaticFacts {
    spec_version: Option<String>,
}

impl StaticFacts {
    /// Facts reporting the given spec version
    pub fn new(spec_version: impl Into<String>) -> Self {
        Self {
            spec_version: Some(spec_version.into()),
        }
    }

    /// Facts with nothing known
    pub fn unknown() -> Self {
        Self::default()
    }
}

impl FactSource for StaticFacts {
    fn spec_version(&self) -> Option<String> {
        self.spec_version.clone()
    }
}

/// Decides whether a task executes
pub trait OnlyIf: fmt::Debug + Send + Sync {
    /// Evaluate against the current facts
    fn should_run(&self, facts: &dyn FactSource) -> bool;

    /// Why the task is skipped when the predicate is false
    fn skip_reason(&self) -> String;
}

/// Whether a generated test task for `version` runs on platform spec `spec_version`.
///
/// 4.x runs only on spec 1.8, 5.x always runs, anything else never runs.
pub fn should_run(version: &str, spec_version: &str) -> bool {
    if version.starts_with('4') {
        spec_version == LEGACY_SPEC_VERSION
    } else {
        version.starts_with('5')
    }
}

/// Gates a matrix test task on the platform it would run on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityPredicate {
    version: String,
}

impl CompatibilityPredicate {
    /// Predicate for the given matrix version
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// The version under test
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl OnlyIf for CompatibilityPredicate {
    fn should_run(&self, facts: &dyn FactSource) -> bool {
        let spec = facts.spec_version().unwrap_or_default();
        should_run(&self.version, &spec)
    }

    fn skip_reason(&self) -> String {
        if self.version.starts_with('4') {
            format!("{} requires spec version {}", self.version, LEGACY_SPEC_VERSION)
        } else {
            format!("no compatible platform for '{}'", self.version)
        }
    }
}

/// Gates the signing task on the signing requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningPredicate {
    required: bool,
}

impl SigningPredicate {
    /// Run the signing task only when `required`
    pub fn new(required: bool) -> Self {
        Self { required }
    }
}

impl OnlyIf for SigningPredicate {
    fn should_run(&self, _facts: &dyn FactSource) -> bool {
        self.required
    }

    fn skip_reason(&self) -> String {
        "signing not required".to_string()
    }
}
