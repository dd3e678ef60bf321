//! Configuration validation

use std::collections::HashSet;

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_matrix(config)?;
    validate_publish(config)?;
    validate_signing(config)?;
    validate_tasks(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

fn validate_matrix(config: &Config) -> Result<()> {
    let matrix = &config.matrix;

    let required = [
        ("matrix.prefix", &matrix.prefix),
        ("matrix.system_property", &matrix.system_property),
        ("matrix.category", &matrix.category),
        ("matrix.checkpoint", &matrix.checkpoint),
        ("matrix.test_command", &matrix.test_command),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(invalid(field, "cannot be empty").into());
        }
    }

    if matrix.checkpoint.starts_with(&matrix.prefix) {
        return Err(invalid(
            "matrix.checkpoint",
            format!("must not start with the rule prefix '{}'", matrix.prefix),
        )
        .into());
    }

    let mut seen = HashSet::new();
    for (i, version) in matrix.versions.iter().enumerate() {
        if version.trim().is_empty() {
            return Err(invalid(format!("matrix.versions[{}]", i), "cannot be empty").into());
        }
        if !seen.insert(version.as_str()) {
            return Err(invalid(
                format!("matrix.versions[{}]", i),
                format!("duplicate entry '{}'", version),
            )
            .into());
        }
    }

    Ok(())
}

fn validate_publish(config: &Config) -> Result<()> {
    let publish = &config.publish;

    if publish.repository_name.trim().is_empty() {
        return Err(invalid("publish.repository_name", "cannot be empty").into());
    }
    if publish.publication.trim().is_empty() {
        return Err(invalid("publish.publication", "cannot be empty").into());
    }
    if publish.snapshot_suffix.is_empty() {
        return Err(invalid("publish.snapshot_suffix", "cannot be empty").into());
    }
    if let Err(e) = url::Url::parse(&publish.base_url) {
        return Err(invalid("publish.base_url", e.to_string()).into());
    }

    Ok(())
}

fn validate_signing(config: &Config) -> Result<()> {
    let signing = &config.signing;

    if signing.username_property.trim().is_empty() {
        return Err(invalid("signing.username_property", "cannot be empty").into());
    }
    if signing.password_property.trim().is_empty() {
        return Err(invalid("signing.password_property", "cannot be empty").into());
    }
    if signing.username_property == signing.password_property {
        return Err(invalid(
            "signing.password_property",
            "must differ from signing.username_property",
        )
        .into());
    }

    Ok(())
}

fn validate_tasks(config: &Config) -> Result<()> {
    if config.tasks.concurrency == 0 {
        return Err(invalid("tasks.concurrency", "must be at least 1").into());
    }
    Ok(())
}
