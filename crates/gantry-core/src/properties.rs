//! Project properties
//!
//! Properties are merged from three sources. Later sources win:
//! the config `[properties]` table, `GANTRY_PROP_*` environment variables,
//! then `-P key=value` command-line flags.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ConfigError, Result};

/// Prefix of environment variables mapped into project properties
pub const ENV_PREFIX: &str = "GANTRY_PROP_";

/// Resolved key/value project properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectProperties {
    values: BTreeMap<String, String>,
}

impl ProjectProperties {
    /// Create an empty property set
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge all sources in precedence order
    pub fn resolve<I>(
        config: &BTreeMap<String, String>,
        env: I,
        cli: &[String],
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut props = Self {
            values: config.clone(),
        };
        props.merge_env(env);
        props.merge_cli(cli)?;
        debug!(count = props.values.len(), "project properties resolved");
        Ok(props)
    }

    /// Merge `GANTRY_PROP_FOO_BAR=value` as `foo.bar=value`
    pub fn merge_env<I>(&mut self, env: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in env {
            if let Some(name) = env_property_name(&key) {
                self.values.insert(name, value);
            }
        }
    }

    /// Merge `key=value` pairs from the command line
    pub fn merge_cli(&mut self, args: &[String]) -> Result<()> {
        for arg in args {
            let (key, value) = arg
                .split_once('=')
                .filter(|(k, _)| !k.trim().is_empty())
                .ok_or_else(|| ConfigError::InvalidProperty(arg.clone()))?;
            self.values.insert(key.trim().to_string(), value.to_string());
        }
        Ok(())
    }

    /// Set a single property
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Look up a property value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Number of defined properties
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no property is defined
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn env_property_name(key: &str) -> Option<String> {
    let rest = key.strip_prefix(ENV_PREFIX)?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_ascii_lowercase().replace('_', "."))
}
