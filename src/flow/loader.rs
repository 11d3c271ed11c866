//! Workflow loader - YAML/JSON file loading and parsing

use super::definition::WorkflowDef;
use super::error::FlowError;
use std::fs;
use std::path::Path;

/// Loads workflow definitions from YAML or JSON files
pub struct WorkflowLoader;

impl WorkflowLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a workflow definition; `.json` files are parsed as JSON, anything else as YAML
    pub fn load_workflow<P: AsRef<Path>>(&self, path: P) -> Result<WorkflowDef, FlowError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        log::debug!("Loaded workflow file {}", path.display());

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::parse_json(&content)
        } else {
            Self::parse_yaml(&content)
        }
    }

    pub fn parse_yaml(content: &str) -> Result<WorkflowDef, FlowError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn parse_json(content: &str) -> Result<WorkflowDef, FlowError> {
        Ok(serde_json::from_str(content)?)
    }
}

impl Default for WorkflowLoader {
    fn default() -> Self {
        Self::new()
    }
}
