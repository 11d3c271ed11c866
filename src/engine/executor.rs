// SPDX-License-Identifier: MIT

//! Scheduling and sequential execution of a workflow graph

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::context::Context;
use super::error::{EngineError, ErrorInfo};
use super::graph::Graph;
use super::node::Node;

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Validating,
    Scheduled,
    /// Running the node at `index` in the execution order
    Executing { index: usize },
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

/// Per-run status of one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// What happened to one node during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub status: NodeStatus,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl NodeRecord {
    fn pending(id: &str) -> Self {
        Self {
            id: id.to_string(),
            status: NodeStatus::Pending,
            output: None,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }
}

/// Report of a run: final (or partial) context plus per-node records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub run_id: Uuid,
    pub workflow: String,
    pub status: RunState,
    pub order: Vec<String>,
    pub context: Context,
    pub nodes: Vec<NodeRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Execution {
    fn new(workflow: &str, context: Context) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            workflow: workflow.to_string(),
            status: RunState::Pending,
            order: Vec::new(),
            context,
            nodes: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn transition(&mut self, next: RunState) {
        let node = match next {
            RunState::Executing { index } => self.order.get(index).map(String::as_str),
            _ => None,
        };
        log::debug!(
            "Run {} of '{}': {:?} -> {:?} {}",
            self.run_id,
            self.workflow,
            self.status,
            next,
            node.unwrap_or_default()
        );
        self.status = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
    }
}

/// A failed run: the error and everything accumulated before it
#[derive(Debug)]
pub struct RunFailure {
    pub error: EngineError,
    pub execution: Execution,
}

impl RunFailure {
    /// Partial context as of the failure
    pub fn context(&self) -> &Context {
        &self.execution.context
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Run of '{}' failed: {}", self.execution.workflow, self.error)
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Progress notifications emitted during a streamed run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Started { run_id: Uuid, order: Vec<String> },
    NodeStarted { node: String },
    NodeCompleted { node: String, output: Value },
    NodeFailed { node: String, error: String },
    Completed { context: Context },
    Failed { error: ErrorInfo },
}

/// Topological order of the graph (Kahn's algorithm).
///
/// Entry nodes are seeded in registration order; successors join the queue
/// in edge insertion order as their in-degree drops to zero.
pub fn schedule(graph: &Graph) -> Result<Vec<Arc<Node>>, EngineError> {
    let mut in_degree: HashMap<&str, usize> = graph.in_degree();
    let mut ready: VecDeque<&str> = graph
        .registry()
        .ids()
        .filter(|id| in_degree[id] == 0)
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(id) = ready.pop_front() {
        order.push(graph.resolve(id)?);
        for target in graph.successors(id) {
            if let Some(d) = in_degree.get_mut(target.as_str()) {
                *d -= 1;
                if *d == 0 {
                    ready.push_back(target.as_str());
                }
            }
        }
    }

    if order.len() < graph.len() {
        let path = graph
            .registry()
            .ids()
            .filter(|id| in_degree[id] > 0)
            .map(str::to_string)
            .collect();
        log::error!("Scheduler found a cycle that passed validation");
        return Err(EngineError::CycleDetected { path });
    }

    Ok(order)
}

/// Drives one run of a graph snapshot
pub(crate) struct Executor<'a> {
    workflow: &'a str,
    graph: &'a Graph,
    events: Option<&'a mpsc::Sender<RunEvent>>,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(workflow: &'a str, graph: &'a Graph) -> Self {
        Self {
            workflow,
            graph,
            events: None,
        }
    }

    pub(crate) fn with_events(mut self, tx: &'a mpsc::Sender<RunEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    async fn emit(&self, event: RunEvent) {
        if let Some(tx) = self.events {
            let _ = tx.send(event).await;
        }
    }

    async fn fail(&self, mut execution: Execution, error: EngineError) -> RunFailure {
        execution.transition(RunState::Failed);
        log::error!("Workflow '{}' failed: {}", self.workflow, error);
        self.emit(RunEvent::Failed {
            error: ErrorInfo::from(&error),
        })
        .await;
        RunFailure { error, execution }
    }

    pub(crate) async fn run(&self, input: Context) -> Result<Execution, RunFailure> {
        let mut execution = Execution::new(self.workflow, input);
        execution
            .context
            .set_metadata("workflow", Value::String(self.workflow.to_string()));
        execution
            .context
            .set_metadata("run_id", Value::String(execution.run_id.to_string()));

        execution.transition(RunState::Validating);
        if let Err(e) = self.graph.validate() {
            return Err(self.fail(execution, e).await);
        }

        let order = match schedule(self.graph) {
            Ok(order) => order,
            Err(e) => return Err(self.fail(execution, e).await),
        };
        execution.order = order.iter().map(|n| n.id().to_string()).collect();
        execution.nodes = order.iter().map(|n| NodeRecord::pending(n.id())).collect();
        execution.transition(RunState::Scheduled);

        log::info!(
            "Running workflow '{}' ({}): {:?}",
            self.workflow,
            execution.run_id,
            execution.order
        );
        self.emit(RunEvent::Started {
            run_id: execution.run_id,
            order: execution.order.clone(),
        })
        .await;

        for (i, node) in order.iter().enumerate() {
            let id = node.id();
            execution.transition(RunState::Executing { index: i });
            execution
                .context
                .set_metadata("node", Value::String(id.to_string()));
            execution.nodes[i].status = NodeStatus::Running;
            execution.nodes[i].started_at = Some(Utc::now());

            log::info!("Executing node: {}", id);
            self.emit(RunEvent::NodeStarted {
                node: id.to_string(),
            })
            .await;

            match node.execute(&execution.context).await {
                Ok(update) => {
                    let output = Value::Object(update.clone());
                    execution.context.merge(update);

                    let record = &mut execution.nodes[i];
                    record.status = NodeStatus::Completed;
                    record.finished_at = Some(Utc::now());
                    record.output = Some(output.clone());

                    log::info!("Node {} completed", id);
                    self.emit(RunEvent::NodeCompleted {
                        node: id.to_string(),
                        output,
                    })
                    .await;
                }
                Err(e) => {
                    let record = &mut execution.nodes[i];
                    record.status = NodeStatus::Failed;
                    record.finished_at = Some(Utc::now());
                    record.error = Some(e.to_string());

                    log::error!("Node {} failed: {}", id, e);
                    self.emit(RunEvent::NodeFailed {
                        node: id.to_string(),
                        error: e.to_string(),
                    })
                    .await;
                    return Err(self.fail(execution, EngineError::node_failure(id, e)).await);
                }
            }
        }

        execution.transition(RunState::Completed);
        log::info!("Workflow '{}' completed", self.workflow);
        self.emit(RunEvent::Completed {
            context: execution.context.clone(),
        })
        .await;

        Ok(execution)
    }
}
