//! Signing gate
//!
//! Signing is only mandatory when full publishing credentials are available.
//! Environments without them (local development) publish unsigned.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SigningConfig;
use crate::properties::ProjectProperties;

/// Optional repository credentials
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    /// Repository username
    pub username: Option<String>,
    /// Repository password
    pub password: Option<String>,
}

impl CredentialSet {
    /// Create a credential set from optional values
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    /// Read credentials from the project properties named in the signing config
    pub fn from_properties(props: &ProjectProperties, config: &SigningConfig) -> Self {
        Self {
            username: props.get(&config.username_property).map(str::to_string),
            password: props.get(&config.password_property).map(str::to_string),
        }
    }

    /// Both credentials present and non-empty
    pub fn is_complete(&self) -> bool {
        present(&self.username) && present(&self.password)
    }

    /// Exactly one credential present and non-empty
    pub fn is_partial(&self) -> bool {
        present(&self.username) != present(&self.password)
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

// Secrets stay out of logs and debug output.
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Whether the publication must be signed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningRequirement {
    /// Signing must succeed before publishing
    Required,
    /// Signing is skipped
    NotRequired,
}

impl SigningRequirement {
    /// Required iff both credentials are present and non-empty
    pub fn from_credentials(credentials: &CredentialSet) -> Self {
        if credentials.is_complete() {
            Self::Required
        } else {
            debug!(
                has_username = credentials.username.is_some(),
                has_password = credentials.password.is_some(),
                "incomplete credentials, signing not required"
            );
            Self::NotRequired
        }
    }

    /// Check if signing is required
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }
}

impl fmt::Display for SigningRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::NotRequired => write!(f, "not required"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(user: Option<&str>, pass: Option<&str>) -> CredentialSet {
        CredentialSet::new(user.map(String::from), pass.map(String::from))
    }

    #[test]
    fn test_no_credentials() {
        let req = SigningRequirement::from_credentials(&CredentialSet::default());
        assert_eq!(req, SigningRequirement::NotRequired);
    }

    #[test]
    fn test_username_only() {
        let req = SigningRequirement::from_credentials(&creds(Some("ci"), None));
        assert_eq!(req, SigningRequirement::NotRequired);
    }

    #[test]
    fn test_password_only() {
        let req = SigningRequirement::from_credentials(&creds(None, Some("secret")));
        assert_eq!(req, SigningRequirement::NotRequired);
    }

    #[test]
    fn test_both_credentials() {
        let req = SigningRequirement::from_credentials(&creds(Some("ci"), Some("secret")));
        assert_eq!(req, SigningRequirement::Required);
        assert!(req.is_required());
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let req = SigningRequirement::from_credentials(&creds(Some("ci"), Some("")));
        assert_eq!(req, SigningRequirement::NotRequired);
    }

    #[test]
    fn test_partial_ignores_empty_values() {
        assert!(creds(Some("ci"), None).is_partial());
        assert!(creds(Some("ci"), Some("")).is_partial());
        assert!(!creds(Some(""), Some("")).is_partial());
        assert!(!creds(None, Some("")).is_partial());
        assert!(!creds(Some("ci"), Some("secret")).is_partial());
    }

    #[test]
    fn test_from_properties() {
        let mut props = ProjectProperties::new();
        props.set("jenkins.username", "ci");
        props.set("jenkins.password", "secret");

        let creds = CredentialSet::from_properties(&props, &SigningConfig::default());
        assert_eq!(creds.username.as_deref(), Some("ci"));
        assert!(creds.is_complete());
    }

    #[test]
    fn test_debug_masks_password() {
        let rendered = format!("{:?}", creds(Some("ci"), Some("secret")));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("***"));
    }
}
