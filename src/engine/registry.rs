// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use super::error::EngineError;
use super::node::{Node, NodeHandle};

/// Per-workflow node table, iterated in registration order
#[derive(Clone, Default)]
pub struct NodeRegistry {
    nodes: Vec<Arc<Node>>,
    index: HashMap<String, usize>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node; an existing identifier is never overwritten
    pub fn register(&mut self, node: Node) -> Result<NodeHandle, EngineError> {
        if self.index.contains_key(node.id()) {
            return Err(EngineError::duplicate(node.id()));
        }

        let handle = NodeHandle::new(node.id());
        self.index.insert(node.id().to_string(), self.nodes.len());
        self.nodes.push(Arc::new(node));
        Ok(handle)
    }

    pub fn resolve(&self, id: &str) -> Result<Arc<Node>, EngineError> {
        self.index
            .get(id)
            .map(|&i| self.nodes[i].clone())
            .ok_or_else(|| EngineError::unknown(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Position of the node in registration order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.nodes.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::Context;
    use serde_json::json;

    fn node(id: &str, value: i64) -> Node {
        Node::from_fn(id, move |_ctx: &Context| Ok(json!({ "v": value })))
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = NodeRegistry::new();
        let handle = registry.register(node("a", 1)).unwrap();

        assert_eq!(handle.id(), "a");
        assert_eq!(registry.resolve("a").unwrap().id(), "a");
        assert!(registry.contains("a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = NodeRegistry::new();
        let err = registry.resolve("missing").unwrap_err();
        assert!(matches!(err, EngineError::UnknownNode { id } if id == "missing"));
    }

    #[tokio::test]
    async fn test_duplicate_is_rejected_and_original_kept() {
        let mut registry = NodeRegistry::new();
        registry.register(node("a", 1)).unwrap();

        let err = registry.register(node("a", 2)).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateIdentifier { .. }));
        assert_eq!(registry.len(), 1);

        let update = registry
            .resolve("a")
            .unwrap()
            .execute(&Context::new())
            .await
            .unwrap();
        assert_eq!(update.get("v"), Some(&json!(1)));
    }

    #[test]
    fn test_registration_order() {
        let mut registry = NodeRegistry::new();
        for id in ["c", "a", "b"] {
            registry.register(node(id, 0)).unwrap();
        }
        assert_eq!(registry.ids().collect::<Vec<_>>(), ["c", "a", "b"]);
        assert_eq!(registry.position("a"), Some(1));
    }
}
