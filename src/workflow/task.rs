use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::TaskError;

use super::context::WorkflowContext;

/// Trait for task implementations invoked by node type during execution.
///
/// Implementations perform exactly one external side effect per `execute`
/// call and store their static schema in a field so `schema()` stays
/// allocation-free.
#[async_trait]
pub trait WorkflowTask: Send + Sync {
    /// The registry key this task is dispatched under
    fn task_type(&self) -> &str;

    /// JSON schema for the task's input, rendered by the builder UI
    fn schema(&self) -> &Value;

    /// Static display metadata for the builder UI
    fn display_info(&self) -> DisplayInfo;

    /// Advisory input validation. Pure and synchronous; the engine never
    /// calls this, the builder UI does before execution.
    fn validate(&self, input: &Value) -> ValidationReport;

    /// Execute the task with the merged node input and the shared context
    async fn execute(&self, input: Value, context: &mut WorkflowContext)
        -> Result<Value, TaskError>;
}

/// UI metadata for a task type
#[derive(Debug, Clone, Serialize)]
pub struct DisplayInfo {
    pub label: String,
    pub category: String,
    pub description: String,
}

impl DisplayInfo {
    pub fn new(
        label: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            category: category.into(),
            description: description.into(),
        }
    }
}

/// Outcome of advisory validation
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(&mut self, message: impl Into<String>) -> &mut Self {
        self.errors.push(message.into());
        self.is_valid = false;
        self
    }

    pub fn warning(&mut self, message: impl Into<String>) -> &mut Self {
        self.warnings.push(message.into());
        self
    }

    /// Record an error when `field` is absent or not a string
    pub fn require_string(&mut self, input: &Value, field: &str) -> &mut Self {
        match input.get(field) {
            Some(Value::String(s)) if !s.is_empty() => {}
            Some(Value::String(_)) => {
                self.error(format!("Field '{}' must not be empty", field));
            }
            Some(_) => {
                self.error(format!("Field '{}' must be a string", field));
            }
            None => {
                self.error(format!("Missing required field '{}'", field));
            }
        }
        self
    }
}

/// Shared shape helpers for task outputs.
///
/// Every successful output carries `success: true` and an RFC 3339
/// `timestamp`; tasks add their own fields on top.
pub fn base_output() -> Map<String, Value> {
    let mut output = Map::new();
    output.insert("success".to_string(), Value::Bool(true));
    output.insert(
        "timestamp".to_string(),
        Value::String(chrono::Utc::now().to_rfc3339()),
    );
    output
}

/// Read a string field from the task input
pub fn required_str<'a>(input: &'a Value, field: &'static str) -> Result<&'a str, TaskError> {
    input
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or(TaskError::MissingField(field))
}

/// Read an optional string field from the task input
pub fn optional_str<'a>(input: &'a Value, field: &str) -> Option<&'a str> {
    input.get(field).and_then(|v| v.as_str())
}

/// Read an optional boolean flag, defaulting to false
pub fn flag(input: &Value, field: &str) -> bool {
    input.get(field).and_then(|v| v.as_bool()).unwrap_or(false)
}

/// Read an optional `ttl_hours` field
pub fn ttl_hours(input: &Value) -> Option<u32> {
    input
        .get("ttl_hours")
        .and_then(|v| v.as_u64())
        .map(|v| v as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_output_shape() {
        let output = base_output();
        assert_eq!(output["success"], json!(true));
        assert!(output["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_required_str() {
        let input = json!({"key": "daily"});
        assert_eq!(required_str(&input, "key").unwrap(), "daily");
        assert!(matches!(
            required_str(&input, "value"),
            Err(TaskError::MissingField("value"))
        ));
    }

    #[test]
    fn test_validation_report_require_string() {
        let mut report = ValidationReport::ok();
        report.require_string(&json!({}), "key");
        assert!(!report.is_valid);
        assert!(report.errors[0].contains("key"));

        let mut report = ValidationReport::ok();
        report.require_string(&json!({"key": 5}), "key");
        assert!(report.errors[0].contains("must be a string"));

        let mut report = ValidationReport::ok();
        report.require_string(&json!({"key": "x"}), "key");
        assert!(report.is_valid);
    }

    #[test]
    fn test_flag_and_ttl() {
        let input = json!({"use_context_key": true, "ttl_hours": 12});
        assert!(flag(&input, "use_context_key"));
        assert!(!flag(&input, "use_context_value"));
        assert_eq!(ttl_hours(&input), Some(12));
        assert_eq!(ttl_hours(&json!({})), None);
    }
}
