//! Exit codes for the CLI

use gantry_core::GantryError;
use gantry_tasks::{ConfigureError, GraphError};

use crate::cli::commands::{TasksFailed, ValidationFailed};

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Task graph error (unknown task, cycle, duplicate registration)
pub const GRAPH_ERROR: i32 = 3;

/// One or more tasks failed
pub const TASK_FAILED: i32 = 4;

/// Validation error
pub const VALIDATION_ERROR: i32 = 5;

/// Map a command error to its exit code
pub fn for_error(err: &anyhow::Error) -> i32 {
    if err.is::<TasksFailed>() {
        return TASK_FAILED;
    }
    if err.is::<ValidationFailed>() {
        return VALIDATION_ERROR;
    }
    if err.is::<GraphError>() {
        return GRAPH_ERROR;
    }
    match err.downcast_ref::<ConfigureError>() {
        Some(ConfigureError::Graph(_)) => return GRAPH_ERROR,
        Some(ConfigureError::Core(GantryError::Config(_))) => return CONFIG_ERROR,
        Some(ConfigureError::MissingSigningCommand { .. }) => return CONFIG_ERROR,
        _ => {}
    }
    match err.downcast_ref::<GantryError>() {
        Some(GantryError::Config(_)) => CONFIG_ERROR,
        _ => ERROR,
    }
}
