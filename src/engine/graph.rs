// SPDX-License-Identifier: MIT

//! Node and edge storage with construction-time validation

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::error::EngineError;
use super::node::{Node, NodeHandle};
use super::registry::NodeRegistry;

/// Directed dependency: `target` runs after `source`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// The structural part of a workflow. Always acyclic.
#[derive(Clone, Default)]
pub struct Graph {
    registry: NodeRegistry,
    edges: Vec<Edge>,
    successors: HashMap<String, Vec<String>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) -> Result<NodeHandle, EngineError> {
        self.registry.register(node)
    }

    /// Insert an edge unless it would close a cycle.
    ///
    /// Returns `false` when the edge was already present.
    pub fn connect(&mut self, source: &str, target: &str) -> Result<bool, EngineError> {
        for id in [source, target] {
            if !self.registry.contains(id) {
                return Err(EngineError::unknown(id));
            }
        }

        if self.successors(source).iter().any(|t| t == target) {
            return Ok(false);
        }

        // s -> t closes a cycle iff s is already reachable from t
        if let Some(mut path) = self.find_path(target, source) {
            path.push(target.to_string());
            return Err(EngineError::CycleDetected { path });
        }

        self.edges.push(Edge::new(source, target));
        self.successors
            .entry(source.to_string())
            .or_default()
            .push(target.to_string());
        Ok(true)
    }

    /// Depth-first search for a path `from -> ... -> to`
    fn find_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(&str, usize)> = vec![(from, 0)];
        visited.insert(from);

        if from == to {
            return Some(vec![from.to_string()]);
        }

        while let Some((current, next)) = stack.last_mut() {
            let succ = self.successors(current);
            if *next >= succ.len() {
                stack.pop();
                continue;
            }
            let child = succ[*next].as_str();
            *next += 1;

            if child == to {
                let mut path: Vec<String> = stack.iter().map(|(id, _)| id.to_string()).collect();
                path.push(child.to_string());
                return Some(path);
            }
            if visited.insert(child) {
                stack.push((child, 0));
            }
        }
        None
    }

    /// Confirm the graph is acyclic and has an entry point
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.registry.is_empty() {
            return Ok(());
        }

        if let Some(path) = self.find_cycle() {
            return Err(EngineError::CycleDetected { path });
        }

        let in_degree = self.in_degree();
        if !self.registry.ids().any(|id| in_degree[id] == 0) {
            return Err(EngineError::NoEntryPoint);
        }

        Ok(())
    }

    /// Full-graph cycle search, independent of the insertion-time check
    fn find_cycle(&self) -> Option<Vec<String>> {
        for edge in &self.edges {
            if let Some(mut path) = self.find_path(&edge.target, &edge.source) {
                path.push(edge.target.clone());
                return Some(path);
            }
        }
        None
    }

    /// Count of incoming edges for every registered node
    pub fn in_degree(&self) -> HashMap<&str, usize> {
        let mut in_degree: HashMap<&str, usize> = self.registry.ids().map(|id| (id, 0)).collect();
        for edge in &self.edges {
            if let Some(d) = in_degree.get_mut(edge.target.as_str()) {
                *d += 1;
            }
        }
        in_degree
    }

    /// Targets of outgoing edges, in insertion order
    pub fn successors(&self, id: &str) -> &[String] {
        self.successors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sources of incoming edges, in insertion order
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.target == id)
            .map(|e| e.source.as_str())
            .collect()
    }

    pub fn resolve(&self, id: &str) -> Result<Arc<Node>, EngineError> {
        self.registry.resolve(id)
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.registry.iter()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn push_edge_unchecked(&mut self, source: &str, target: &str) {
        self.edges.push(Edge::new(source, target));
        self.successors
            .entry(source.to_string())
            .or_default()
            .push(target.to_string());
    }
}
