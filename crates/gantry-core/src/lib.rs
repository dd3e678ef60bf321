//! Gantry Core - Core library for build orchestration
//!
//! This crate provides the foundational types, error handling, configuration,
//! project properties and the publication decisions (target repository and
//! signing requirement) used by the Gantry task layer.

pub mod config;
pub mod error;
pub mod properties;
pub mod publish;
pub mod signing;
pub mod version;

pub use error::{ConfigError, GantryError, PublishError, Result};
pub use properties::ProjectProperties;
pub use publish::{PublishPlan, PublishTarget, Repository};
pub use signing::{CredentialSet, SigningRequirement};
pub use version::{DisplayVersion, UNSPECIFIED_VERSION};
