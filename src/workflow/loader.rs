//! Workflow loader - definition file loading and parsing
//!
//! Definitions come from the builder UI as JSON or live on disk as YAML;
//! the loader picks the parser from the file extension.

use std::path::Path;

use crate::error::WorkflowError;

use super::types::WorkflowDefinition;

/// Loads workflow definitions from YAML or JSON files
pub struct WorkflowLoader;

impl WorkflowLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a workflow definition from a file, picking the format by extension
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<WorkflowDefinition, WorkflowError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WorkflowError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::parse_yaml(&content),
            Some("json") => Self::parse_json(&content),
            _ => Err(WorkflowError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Parse a workflow definition from a YAML string
    pub fn parse_yaml(content: &str) -> Result<WorkflowDefinition, WorkflowError> {
        let def: WorkflowDefinition = serde_yaml::from_str(content)?;
        Ok(def)
    }

    /// Parse a workflow definition from a JSON string
    pub fn parse_json(content: &str) -> Result<WorkflowDefinition, WorkflowError> {
        let def: WorkflowDefinition = serde_json::from_str(content)?;
        Ok(def)
    }
}

impl Default for WorkflowLoader {
    fn default() -> Self {
        Self::new()
    }
}
