// SPDX-License-Identifier: MIT

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use super::error::{ApiError, ApiResult};
use super::store::WorkflowStore;
use crate::engine::{Context, Execution, NodeSummary, RunEvent, Workflow, WorkflowSummary};
use crate::flow::nodes;

#[derive(Debug, Deserialize)]
pub struct CreateWorkflowRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct AddNodeRequest {
    pub node_name: String,
    pub node_type: String,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub source_node: String,
    pub target_node: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub input_data: Value,
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "fittingflow",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn lookup(store: &WorkflowStore, name: &str) -> ApiResult<Workflow> {
    store
        .get(name)
        .await
        .ok_or_else(|| ApiError::WorkflowNotFound(name.to_string()))
}

/// Decode an optional JSON body; an empty body yields the default
fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
}

fn input_context(request: RunRequest) -> ApiResult<Context> {
    Context::from_value(request.input_data)
        .map_err(|e| ApiError::bad_request(format!("input_data must be an object: {}", e)))
}

pub async fn create_workflow(
    State(store): State<WorkflowStore>,
    Json(request): Json<CreateWorkflowRequest>,
) -> ApiResult<(StatusCode, Json<WorkflowSummary>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Workflow name must not be empty"));
    }

    let workflow = Workflow::new(name).with_description(request.description);
    if !store.insert(workflow.clone()).await {
        return Err(ApiError::WorkflowExists(name.to_string()));
    }
    log::info!("Created workflow '{}'", name);
    Ok((StatusCode::CREATED, Json(workflow.summary().await)))
}

pub async fn list_workflows(State(store): State<WorkflowStore>) -> Json<Vec<WorkflowSummary>> {
    let mut summaries = Vec::new();
    for workflow in store.list().await {
        summaries.push(workflow.summary().await);
    }
    Json(summaries)
}

pub async fn get_workflow(
    State(store): State<WorkflowStore>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    let workflow = lookup(&store, &name).await?;
    let summary = workflow.summary().await;
    let order = workflow.execution_order().await.ok();
    Ok(Json(json!({
        "name": summary.name,
        "description": summary.description,
        "nodes": summary.nodes,
        "edges": summary.edges,
        "execution_order": order,
    })))
}

pub async fn delete_workflow(
    State(store): State<WorkflowStore>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    store
        .remove(&name)
        .await
        .ok_or_else(|| ApiError::WorkflowNotFound(name.clone()))?;
    log::info!("Deleted workflow '{}'", name);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_node(
    State(store): State<WorkflowStore>,
    Path(name): Path<String>,
    Json(request): Json<AddNodeRequest>,
) -> ApiResult<(StatusCode, Json<NodeSummary>)> {
    let workflow = lookup(&store, &name).await?;
    let node = nodes::build(&request.node_type, &request.node_name, &request.config)?;
    let summary = NodeSummary::from(&node);
    workflow.add(node).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn connect_nodes(
    State(store): State<WorkflowStore>,
    Path(name): Path<String>,
    Json(request): Json<ConnectRequest>,
) -> ApiResult<Json<Value>> {
    let workflow = lookup(&store, &name).await?;
    workflow
        .connect(&request.source_node, &request.target_node)
        .await?;
    Ok(Json(json!({
        "source": request.source_node,
        "target": request.target_node,
    })))
}

pub async fn run_workflow(
    State(store): State<WorkflowStore>,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Execution>> {
    let workflow = lookup(&store, &name).await?;
    let input = input_context(optional_body(&body)?)?;
    let execution = workflow.run(input).await?;
    Ok(Json(execution))
}

pub async fn stream_run(
    State(store): State<WorkflowStore>,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let workflow = lookup(&store, &name).await?;
    let input = input_context(optional_body(&body)?)?;
    let (tx, rx) = mpsc::channel::<RunEvent>(100);

    tokio::spawn(async move {
        log::info!("Starting streamed run of '{}'", workflow.name());
        // Failures already reach the client as a `failed` event
        if let Err(failure) = workflow.run_stream(input, tx).await {
            log::debug!("Streamed run ended with error: {}", failure);
        }
    });

    let stream = ReceiverStream::new(rx).map(|event| Event::default().json_data(event));
    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(1))))
}
