//! Publication target resolution

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::error::{PublishError, Result};
use crate::properties::ProjectProperties;
use crate::signing::{CredentialSet, SigningRequirement};

/// Repository path an artifact is published to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishTarget {
    /// Pre-release artifacts
    Snapshots,
    /// Final releases
    Releases,
}

impl PublishTarget {
    /// Pick the target from the artifact version and the pre-release suffix
    pub fn for_version(version: &str, snapshot_suffix: &str) -> Self {
        if version.ends_with(snapshot_suffix) {
            Self::Snapshots
        } else {
            Self::Releases
        }
    }

    /// Path segment appended to the repository base URL
    pub fn path(&self) -> &'static str {
        match self {
            Self::Snapshots => "snapshots",
            Self::Releases => "releases",
        }
    }
}

impl fmt::Display for PublishTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A concrete repository to upload into
#[derive(Debug, Clone)]
pub struct Repository {
    /// Repository name (e.g. "JenkinsCommunity")
    pub name: String,
    /// Full repository URL including the target path
    pub url: url::Url,
    /// Credentials used for the upload
    pub credentials: CredentialSet,
}

impl Repository {
    /// Build the repository URL as `<base_url>/<target path>`
    pub fn resolve(
        name: impl Into<String>,
        base_url: &str,
        target: PublishTarget,
        credentials: CredentialSet,
    ) -> Result<Self> {
        let invalid = |reason: String| PublishError::InvalidRepositoryUrl {
            url: base_url.to_string(),
            reason,
        };

        let mut base = url::Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let url = base
            .join(target.path())
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            url,
            credentials,
        })
    }
}

/// Everything the publish tasks need, resolved once per invocation
#[derive(Debug, Clone)]
pub struct PublishPlan {
    /// Artifact version string
    pub version: String,
    /// Publication name (e.g. "pluginMaven")
    pub publication: String,
    /// Selected target
    pub target: PublishTarget,
    /// Destination repository
    pub repository: Repository,
    /// Whether signing is mandatory
    pub signing: SigningRequirement,
}

impl PublishPlan {
    /// Resolve the target repository and signing requirement
    pub fn resolve(config: &Config, props: &ProjectProperties) -> Result<Self> {
        let target = PublishTarget::for_version(&config.version, &config.publish.snapshot_suffix);
        let credentials = CredentialSet::from_properties(props, &config.signing);
        let signing = SigningRequirement::from_credentials(&credentials);
        let repository = Repository::resolve(
            &config.publish.repository_name,
            &config.publish.base_url,
            target,
            credentials,
        )?;

        info!(
            version = %config.version,
            target = %target,
            repository = %repository.url,
            signing = %signing,
            "publish plan resolved"
        );

        Ok(Self {
            version: config.version.clone(),
            publication: config.publish.publication.clone(),
            target,
            repository,
            signing,
        })
    }

    /// Name of the signing task for this publication
    pub fn sign_task_name(&self) -> String {
        format!("sign{}Publication", capitalize(&self.publication))
    }

    /// Name of the upload task for this publication and repository
    pub fn publish_task_name(&self) -> String {
        format!(
            "publish{}PublicationTo{}Repository",
            capitalize(&self.publication),
            capitalize(&self.repository.name)
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
