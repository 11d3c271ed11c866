// SPDX-License-Identifier: MIT

//! Nodes: named units of work over the shared context

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use super::context::Context;
use super::error::NodeError;

/// The callable part of a node.
///
/// Implement this directly for nodes that need to await; plain closures are
/// wrapped by [`Node::from_fn`].
#[async_trait]
pub trait NodeHandler: Send + Sync {
    /// Produce a partial update for the context
    async fn call(&self, ctx: &Context) -> Result<Value, NodeError>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F> NodeHandler for FnHandler<F>
where
    F: Fn(&Context) -> Result<Value, NodeError> + Send + Sync,
{
    async fn call(&self, ctx: &Context) -> Result<Value, NodeError> {
        (self.0)(ctx)
    }
}

/// A registered unit of work. Immutable once built.
#[derive(Clone)]
pub struct Node {
    id: String,
    kind: String,
    description: String,
    outputs: Vec<String>,
    handler: Arc<dyn NodeHandler>,
}

impl Node {
    pub fn new(id: impl Into<String>, handler: Arc<dyn NodeHandler>) -> Self {
        Self {
            id: id.into(),
            kind: "fn".to_string(),
            description: String::new(),
            outputs: Vec::new(),
            handler,
        }
    }

    /// Wrap a synchronous closure
    pub fn from_fn<F>(id: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Context) -> Result<Value, NodeError> + Send + Sync + 'static,
    {
        Self::new(id, Arc::new(FnHandler(f)))
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare the keys this node is expected to write
    pub fn with_outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Invoke the handler and normalize its result into a partial update
    pub async fn execute(&self, ctx: &Context) -> Result<Map<String, Value>, NodeError> {
        let value = self.handler.call(ctx).await?;
        let update = into_update(value);

        for key in &self.outputs {
            if !update.contains_key(key) {
                log::warn!("Node {} did not write declared output '{}'", self.id, key);
            }
        }

        Ok(update)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// Objects merge as-is, `null` is an empty update, anything else lands under "result"
fn into_update(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("result".to_string(), other);
            map
        }
    }
}

/// Lightweight reference to a registered node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    id: String,
}

impl NodeHandle {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl AsRef<str> for NodeHandle {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
