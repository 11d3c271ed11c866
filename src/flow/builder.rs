// SPDX-License-Identifier: MIT

//! Workflow builder - turns definitions into runnable workflows

use std::path::Path;

use super::definition::WorkflowDef;
use super::error::FlowError;
use super::loader::WorkflowLoader;
use super::nodes;
use crate::engine::Workflow;

/// High-level builder for constructing workflows from YAML/JSON definitions
pub struct Builder {
    loader: WorkflowLoader,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            loader: WorkflowLoader::new(),
        }
    }

    /// Build a workflow from a definition file
    pub async fn build_from_file<P: AsRef<Path>>(&self, path: P) -> Result<Workflow, FlowError> {
        let def = self.loader.load_workflow(path)?;
        self.build_from_def(&def).await
    }

    /// Build a workflow from a parsed definition.
    ///
    /// Nodes are registered in definition order; `depends_on` edges follow in
    /// node order, then the explicit `edges` list.
    pub async fn build_from_def(&self, def: &WorkflowDef) -> Result<Workflow, FlowError> {
        if def.name.trim().is_empty() {
            return Err(FlowError::definition("workflow name must not be empty"));
        }
        let workflow = Workflow::new(def.name.clone()).with_description(def.description.clone());

        for node_def in &def.nodes {
            let mut node = nodes::build(&node_def.kind, &node_def.id, &node_def.config)?;
            if !node_def.outputs.is_empty() {
                let mut outputs = node.outputs().to_vec();
                for key in &node_def.outputs {
                    if !outputs.contains(key) {
                        outputs.push(key.clone());
                    }
                }
                node = node.with_outputs(outputs);
            }
            workflow.add(node).await?;
        }

        for node_def in &def.nodes {
            for dep in &node_def.depends_on {
                workflow.connect(dep, &node_def.id).await?;
            }
        }
        for edge in &def.edges {
            workflow.connect(&edge.source, &edge.target).await?;
        }

        workflow.validate().await?;
        log::info!(
            "Built workflow '{}' with {} nodes",
            def.name,
            def.nodes.len()
        );
        Ok(workflow)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Context, EngineError};
    use serde_json::json;

    async fn build(yaml: &str) -> Result<Workflow, FlowError> {
        let def = WorkflowLoader::parse_yaml(yaml).unwrap();
        Builder::new().build_from_def(&def).await
    }

    #[tokio::test]
    async fn test_build_and_run() {
        let workflow = build(
            r#"
name: greet
nodes:
  - id: start
    kind: set
    config: { values: { msg: hi } }
  - id: upper
    kind: upper
    depends_on: start
"#,
        )
        .await
        .unwrap();

        let execution = workflow.run(Context::new()).await.unwrap();
        assert_eq!(
            execution.context.to_json(),
            json!({"msg": "hi", "result": "HI"})
        );
    }

    #[tokio::test]
    async fn test_depends_on_edges_precede_explicit_edges() {
        let workflow = build(
            r#"
name: order
nodes:
  - id: a
    kind: start
  - id: b
    kind: start
  - id: c
    kind: start
    depends_on: [b]
edges:
  - { source: a, target: b }
"#,
        )
        .await
        .unwrap();

        let summary = workflow.summary().await;
        assert_eq!(summary.edges[0].source, "b");
        assert_eq!(summary.edges[1].source, "a");
        assert_eq!(workflow.execution_order().await.unwrap(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_declared_outputs_are_merged() {
        let workflow = build(
            r#"
name: outputs
nodes:
  - id: t
    kind: template
    config: { template: "x" }
    outputs: [text, extra]
"#,
        )
        .await
        .unwrap();
        assert_eq!(workflow.summary().await.nodes[0].outputs, ["text", "extra"]);
    }

    #[tokio::test]
    async fn test_cycle_in_definition() {
        let result = build(
            r#"
name: loop
nodes:
  - id: a
    kind: start
    depends_on: b
  - id: b
    kind: start
    depends_on: a
"#,
        )
        .await;
        assert!(matches!(
            result,
            Err(FlowError::Engine(EngineError::CycleDetected { .. }))
        ));
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let result = build("name: \"\"\nnodes: []").await;
        assert!(matches!(result, Err(FlowError::Definition(_))));
    }

    #[tokio::test]
    async fn test_unknown_dependency() {
        let result = build(
            r#"
name: missing
nodes:
  - id: a
    kind: start
    depends_on: ghost
"#,
        )
        .await;
        assert!(matches!(
            result,
            Err(FlowError::Engine(EngineError::UnknownNode { id })) if id == "ghost"
        ));
    }

    #[tokio::test]
    async fn test_duplicate_node_in_definition() {
        let result = build(
            r#"
name: dup
nodes:
  - id: a
    kind: start
  - id: a
    kind: end
"#,
        )
        .await;
        assert!(matches!(
            result,
            Err(FlowError::Engine(EngineError::DuplicateIdentifier { .. }))
        ));
    }
}
