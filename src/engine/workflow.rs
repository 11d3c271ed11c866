// SPDX-License-Identifier: MIT

//! Workflow handle: construction API and the `run` entry point

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use super::context::Context;
use super::error::{EngineError, NodeError};
use super::executor::{self, Execution, Executor, RunEvent, RunFailure};
use super::graph::{Edge, Graph};
use super::node::{Node, NodeHandle};

/// A named workflow graph.
///
/// Cloning yields another handle to the same graph. Runs execute against a
/// snapshot; structural changes are refused while any run is active.
#[derive(Clone)]
pub struct Workflow {
    name: Arc<str>,
    description: Arc<str>,
    graph: Arc<RwLock<Graph>>,
    active_runs: Arc<AtomicUsize>,
}

/// Serializable view of a workflow's structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub name: String,
    pub description: String,
    pub nodes: Vec<NodeSummary>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
}

/// Marks a run as active until dropped
struct RunGuard(Arc<AtomicUsize>);

impl From<&Node> for NodeSummary {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id().to_string(),
            kind: node.kind().to_string(),
            description: node.description().to_string(),
            outputs: node.outputs().to_vec(),
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            description: Arc::from(""),
            graph: Arc::new(RwLock::new(Graph::new())),
            active_runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Arc::from(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether a run is currently executing
    pub fn is_running(&self) -> bool {
        self.active_runs.load(Ordering::SeqCst) > 0
    }

    fn ensure_unlocked(&self) -> Result<(), EngineError> {
        if self.is_running() {
            return Err(EngineError::WorkflowLocked {
                workflow: self.name.to_string(),
            });
        }
        Ok(())
    }

    /// Register a closure as a node
    pub async fn add_node<F>(&self, id: impl Into<String>, f: F) -> Result<NodeHandle, EngineError>
    where
        F: Fn(&Context) -> Result<Value, NodeError> + Send + Sync + 'static,
    {
        self.add(Node::from_fn(id, f)).await
    }

    /// Register a fully built node
    pub async fn add(&self, node: Node) -> Result<NodeHandle, EngineError> {
        let mut graph = self.graph.write().await;
        self.ensure_unlocked()?;
        let handle = graph.add_node(node)?;
        log::debug!("Workflow '{}': added node {}", self.name, handle);
        Ok(handle)
    }

    /// Record an edge `source -> target`
    pub async fn connect(
        &self,
        source: impl AsRef<str>,
        target: impl AsRef<str>,
    ) -> Result<(), EngineError> {
        let (source, target) = (source.as_ref(), target.as_ref());
        let mut graph = self.graph.write().await;
        self.ensure_unlocked()?;
        if graph.connect(source, target)? {
            log::debug!("Workflow '{}': connected {} -> {}", self.name, source, target);
        }
        Ok(())
    }

    pub async fn validate(&self) -> Result<(), EngineError> {
        self.graph.read().await.validate()
    }

    /// The order `run` would execute nodes in
    pub async fn execution_order(&self) -> Result<Vec<String>, EngineError> {
        let graph = self.graph.read().await;
        graph.validate()?;
        Ok(executor::schedule(&graph)?
            .iter()
            .map(|n| n.id().to_string())
            .collect())
    }

    pub async fn summary(&self) -> WorkflowSummary {
        let graph = self.graph.read().await;
        WorkflowSummary {
            name: self.name.to_string(),
            description: self.description.to_string(),
            nodes: graph.nodes().map(|n| NodeSummary::from(n.as_ref())).collect(),
            edges: graph.edges().to_vec(),
        }
    }

    pub async fn node_count(&self) -> usize {
        self.graph.read().await.len()
    }

    /// Take a snapshot and mark the run active under the same read lock
    async fn begin_run(&self) -> (Graph, RunGuard) {
        let graph = self.graph.read().await;
        self.active_runs.fetch_add(1, Ordering::SeqCst);
        (graph.clone(), RunGuard(self.active_runs.clone()))
    }

    /// Execute every node once, in dependency order
    pub async fn run(&self, input: Context) -> Result<Execution, RunFailure> {
        let (graph, _guard) = self.begin_run().await;
        Executor::new(&self.name, &graph).run(input).await
    }

    /// Like [`Workflow::run`], reporting progress on `tx`
    pub async fn run_stream(
        &self,
        input: Context,
        tx: mpsc::Sender<RunEvent>,
    ) -> Result<Execution, RunFailure> {
        let (graph, _guard) = self.begin_run().await;
        Executor::new(&self.name, &graph)
            .with_events(&tx)
            .run(input)
            .await
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("active_runs", &self.active_runs.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
