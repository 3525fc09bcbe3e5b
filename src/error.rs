// SPDX-License-Identifier: MIT

//! Typed error handling for agent-mesh
//!
//! One enum per layer: storage backends, workflow execution, individual
//! tasks, and the MCP tool bridge. The binary boundary uses `anyhow`.

use thiserror::Error;

/// Top-level error type for agent-mesh
#[derive(Debug, Error)]
pub enum MeshError {
    /// Configuration errors (missing env vars, invalid config)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage backend errors
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Workflow-level errors
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper for compatibility
    #[error("{0}")]
    Other(String),
}

impl MeshError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Errors raised by key-value, artifact, and event-bus backends
#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid key (empty, or escaping the store root)
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Serialization of a stored value failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors from the filesystem backend
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Backend-specific failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Workflow definition and engine errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A node's task type has no registration
    #[error("Task type '{0}' is not registered")]
    TaskNotFound(String),

    /// Two nodes share an id
    #[error("Duplicate node id '{0}'")]
    DuplicateNodeId(String),

    /// A connection references a node that does not exist
    #[error("Connection references unknown node '{node_id}' on the {side} side")]
    UnknownNodeReference { node_id: String, side: &'static str },

    /// The connection graph is not acyclic
    #[error("Cycle detected in workflow graph")]
    CycleDetected,

    /// A node failed during execution
    #[error(transparent)]
    Task(#[from] TaskExecutionError),

    /// File not found when loading a workflow definition
    #[error("Workflow file not found: {0}")]
    FileNotFound(String),

    /// Workflow file extension is not .yaml/.yml/.json
    #[error("Unsupported workflow file format: {0}")]
    UnsupportedFormat(String),

    /// I/O errors while loading a definition
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors raised inside a single task's `execute`
#[derive(Debug, Error)]
pub enum TaskError {
    /// A required input field is absent
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    /// An input field is present but unusable
    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// The backing store rejected the call
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The HTTP task's request failed
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// JSON handling failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl TaskError {
    /// Create an invalid-field error
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A task failure annotated with where it happened
#[derive(Debug, Error)]
#[error("Task '{task_type}' failed at node '{node_id}': {message}")]
pub struct TaskExecutionError {
    pub task_type: String,
    pub node_id: String,
    pub message: String,
    #[source]
    pub source: TaskError,
}

impl TaskExecutionError {
    pub fn new(task_type: impl Into<String>, node_id: impl Into<String>, source: TaskError) -> Self {
        Self {
            task_type: task_type.into(),
            node_id: node_id.into(),
            message: source.to_string(),
            source,
        }
    }
}

/// Errors raised by MCP tool handlers
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Malformed or missing tool arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// No handler registered under the requested name
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Storage backend failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Workflow failure inside workflow_start/workflow_status
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Internal handler error
    #[error("Internal handler error: {0}")]
    Internal(String),
}

// Allow conversion from &str for ad-hoc error sites
impl From<&str> for MeshError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for MeshError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}
