// SPDX-License-Identifier: MIT

//! YAML/JSON schema types for workflow definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level workflow definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Nodes, registered in file order
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    /// Extra edges, applied after every `depends_on`
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
}

/// A node in the workflow graph
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeDef {
    /// Unique identifier for this node
    pub id: String,
    /// Builtin kind, see [`crate::flow::nodes::KINDS`]
    pub kind: String,
    /// Kind-specific configuration
    #[serde(default)]
    pub config: Value,
    /// Nodes that must complete before this runs
    #[serde(default)]
    pub depends_on: Dependencies,
    /// Declared output keys, merged with the ones the kind declares
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// An explicit edge
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EdgeDef {
    pub source: String,
    pub target: String,
}

/// Upstream node ids; a definition may give one id or a list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<IdOrList>")]
pub struct Dependencies(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum IdOrList {
    Id(String),
    List(Vec<String>),
}

impl From<Option<IdOrList>> for Dependencies {
    fn from(raw: Option<IdOrList>) -> Self {
        match raw {
            None => Self::default(),
            Some(IdOrList::Id(id)) => Self(vec![id]),
            Some(IdOrList::List(ids)) => Self(ids),
        }
    }
}

impl Dependencies {
    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Dependencies {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
