// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{json, Value};

use crate::error::TaskError;
use crate::workflow::context::WorkflowContext;
use crate::workflow::task::{
    base_output, optional_str, required_str, DisplayInfo, ValidationReport, WorkflowTask,
};

static HTTP_REQUEST_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "url": {
                "type": "string",
                "description": "The request URL"
            },
            "method": {
                "type": "string",
                "enum": ["GET", "POST", "PUT", "DELETE", "PATCH"],
                "description": "HTTP method (default GET)"
            },
            "headers": {
                "type": "object",
                "description": "Optional request headers"
            },
            "body": {
                "description": "Optional JSON request body"
            }
        },
        "required": ["url"]
    })
});

const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];

/// Performs one HTTP request.
///
/// JSON responses are parsed into structured values, everything else is
/// returned as text. Retry and timeout policy is the client's own.
pub struct HttpRequestTask {
    client: Client,
}

impl HttpRequestTask {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpRequestTask {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowTask for HttpRequestTask {
    fn task_type(&self) -> &str {
        "http-request"
    }

    fn schema(&self) -> &Value {
        &HTTP_REQUEST_SCHEMA
    }

    fn display_info(&self) -> DisplayInfo {
        DisplayInfo::new("HTTP Request", "integration", "Call an HTTP endpoint")
    }

    fn validate(&self, input: &Value) -> ValidationReport {
        let mut report = ValidationReport::ok();
        report.require_string(input, "url");
        if let Some(raw) = optional_str(input, "url") {
            if url::Url::parse(raw).is_err() {
                report.error(format!("Field 'url' is not a valid URL: {}", raw));
            }
        }
        if let Some(method) = optional_str(input, "method") {
            if !METHODS.contains(&method.to_ascii_uppercase().as_str()) {
                report.error(format!("Unsupported HTTP method '{}'", method));
            }
        }
        report
    }

    async fn execute(
        &self,
        input: Value,
        _context: &mut WorkflowContext,
    ) -> Result<Value, TaskError> {
        let raw_url = required_str(&input, "url")?;
        let url = url::Url::parse(raw_url)
            .map_err(|err| TaskError::invalid_field("url", err.to_string()))?;

        let method = optional_str(&input, "method")
            .unwrap_or("GET")
            .to_ascii_uppercase();
        let method: reqwest::Method = method
            .parse()
            .map_err(|_| TaskError::invalid_field("method", method.clone()))?;

        let mut request = self.client.request(method, url);

        if let Some(Value::Object(headers)) = input.get("headers") {
            for (name, value) in headers {
                if let Some(value) = value.as_str() {
                    request = request.header(name, value);
                }
            }
        }

        if let Some(body) = input.get("body").filter(|v| !v.is_null()) {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        let mut output = base_output();
        output.insert("status".to_string(), json!(status));
        output.insert("body".to_string(), body);
        Ok(Value::Object(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_url() {
        let task = HttpRequestTask::new();
        assert!(!task.validate(&json!({})).is_valid);
        assert!(task.validate(&json!({"url": "https://example.com/x"})).is_valid);
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let task = HttpRequestTask::new();
        let report = task.validate(&json!({"url": "not a url"}));
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("valid URL")));
    }

    #[test]
    fn test_validate_rejects_bad_method() {
        let task = HttpRequestTask::new();
        let report = task.validate(&json!({"url": "https://example.com", "method": "FETCH"}));
        assert!(!report.is_valid);
    }

    #[tokio::test]
    async fn test_execute_rejects_bad_url() {
        let task = HttpRequestTask::new();
        let mut ctx = WorkflowContext::new();
        let err = task
            .execute(json!({"url": "::nope::"}), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidField { .. }));
    }
}
