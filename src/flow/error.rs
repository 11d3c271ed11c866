// SPDX-License-Identifier: MIT

//! Application-level errors
//!
//! Wraps engine errors together with everything that can go wrong while
//! loading definitions and building nodes from them.

use thiserror::Error;

use super::condition::ConditionError;
use super::nodes::KINDS;
use crate::engine::EngineError;

/// Top-level error type for fittingflow-rs
#[derive(Debug, Error)]
pub enum FlowError {
    /// Construction or execution errors from the engine
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Node kind not present in the catalog
    #[error("Unknown node kind '{0}', expected one of: {}", KINDS.join(", "))]
    UnknownKind(String),

    /// Node config missing a field or holding the wrong type
    #[error("Invalid config for node '{node}': {message}")]
    InvalidConfig { node: String, message: String },

    /// Malformed `if` condition
    #[error("Invalid condition for node '{node}': {source}")]
    Condition {
        node: String,
        #[source]
        source: ConditionError,
    },

    /// Configuration errors (bad env vars, invalid addresses)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workflow definition errors
    #[error("Definition error: {0}")]
    Definition(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl FlowError {
    pub fn invalid_config(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            node: node.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn definition(message: impl Into<String>) -> Self {
        Self::Definition(message.into())
    }
}
