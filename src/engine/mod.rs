// SPDX-License-Identifier: MIT

//! Workflow engine
//!
//! This module provides the core graph engine:
//! - `Workflow` - construction API (`add_node`, `connect`) and `run`
//! - `Context` - ordered key/value data threaded through a run
//! - `Node` / `NodeHandler` - units of work
//! - `Execution` / `RunFailure` - run reports

pub mod context;
pub mod error;
pub mod executor;
pub mod graph;
pub mod node;
pub mod registry;
pub mod workflow;

pub use context::Context;
pub use error::{EngineError, ErrorInfo, NodeError};
pub use executor::{schedule, Execution, NodeRecord, NodeStatus, RunEvent, RunFailure, RunState};
pub use graph::{Edge, Graph};
pub use node::{Node, NodeHandle, NodeHandler};
pub use registry::NodeRegistry;
pub use workflow::{NodeSummary, Workflow, WorkflowSummary};
