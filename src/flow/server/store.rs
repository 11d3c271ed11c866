// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::Workflow;

/// In-memory set of named workflows shared by all handlers
#[derive(Clone)]
pub struct WorkflowStore {
    workflows: Arc<RwLock<HashMap<String, Workflow>>>,
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self {
            workflows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store `workflow` under its name; returns `false` if the name is taken
    pub async fn insert(&self, workflow: Workflow) -> bool {
        let mut workflows = self.workflows.write().await;
        if workflows.contains_key(workflow.name()) {
            return false;
        }
        workflows.insert(workflow.name().to_string(), workflow);
        true
    }

    pub async fn get(&self, name: &str) -> Option<Workflow> {
        let workflows = self.workflows.read().await;
        workflows.get(name).cloned()
    }

    pub async fn remove(&self, name: &str) -> Option<Workflow> {
        let mut workflows = self.workflows.write().await;
        workflows.remove(name)
    }

    /// All workflows, sorted by name
    pub async fn list(&self) -> Vec<Workflow> {
        let workflows = self.workflows.read().await;
        let mut list: Vec<Workflow> = workflows.values().cloned().collect();
        list.sort_by(|a, b| a.name().cmp(b.name()));
        list
    }
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}
