// SPDX-License-Identifier: MIT

//! Typed errors for graph construction and execution

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type returned by node callables
pub type NodeError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the engine while building or running a workflow
#[derive(Debug, Error)]
pub enum EngineError {
    /// A node with this identifier is already registered
    #[error("Node '{id}' is already registered")]
    DuplicateIdentifier { id: String },

    /// A referenced node is not registered
    #[error("Node '{id}' not found")]
    UnknownNode { id: String },

    /// The edge (or the graph) would contain a cycle
    #[error("Cycle detected: {}", .path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    /// A non-empty graph has no node without incoming edges
    #[error("Workflow has no entry point")]
    NoEntryPoint,

    /// Structural mutation attempted while a run is active
    #[error("Workflow '{workflow}' is locked by an active run")]
    WorkflowLocked { workflow: String },

    /// A node callable returned an error
    #[error("Node '{node}' failed: {source}")]
    NodeFailure {
        node: String,
        #[source]
        source: NodeError,
    },
}

impl EngineError {
    pub fn duplicate(id: impl Into<String>) -> Self {
        Self::DuplicateIdentifier { id: id.into() }
    }

    pub fn unknown(id: impl Into<String>) -> Self {
        Self::UnknownNode { id: id.into() }
    }

    pub fn node_failure(node: impl Into<String>, source: NodeError) -> Self {
        Self::NodeFailure {
            node: node.into(),
            source,
        }
    }

    /// Stable snake_case name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateIdentifier { .. } => "duplicate_identifier",
            Self::UnknownNode { .. } => "unknown_node",
            Self::CycleDetected { .. } => "cycle_detected",
            Self::NoEntryPoint => "no_entry_point",
            Self::WorkflowLocked { .. } => "workflow_locked",
            Self::NodeFailure { .. } => "node_failure",
        }
    }

    /// Identifier of the node the error is about, if any
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::DuplicateIdentifier { id } | Self::UnknownNode { id } => Some(id),
            Self::NodeFailure { node, .. } => Some(node),
            _ => None,
        }
    }

    /// Construction errors leave the workflow usable
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIdentifier { .. }
                | Self::UnknownNode { .. }
                | Self::CycleDetected { .. }
                | Self::NoEntryPoint
        )
    }
}

/// Client-safe description of an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    pub message: String,
}

impl From<&EngineError> for ErrorInfo {
    fn from(err: &EngineError) -> Self {
        Self {
            kind: err.kind().to_string(),
            node: err.node().map(str::to_string),
            message: err.to_string(),
        }
    }
}
