//! Tool trait and the values that flow through it.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::context::ToolContext;

pub use crate::error::ToolError;

/// Which part of the helpdesk a tool belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolDomain {
    /// Onboarding progress: checklist, steps, sandbox and dummy data.
    Onboarding,
    /// Read-only company knowledge lookups.
    Knowledge,
}

/// Name, description and JSON schema of a tool, as advertised to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
    pub domain: ToolDomain,
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutput {
    /// Human-readable reply, as shown in chat.
    pub text: String,
    /// Structured payload, when the tool has one.
    pub data: Option<serde_json::Value>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl ToolOutput {
    /// Plain text result.
    pub fn text(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            text: text.into(),
            data: None,
            duration,
        }
    }

    /// Text plus a structured payload.
    pub fn success(text: impl Into<String>, data: serde_json::Value, duration: Duration) -> Self {
        Self {
            text: text.into(),
            data: Some(data),
            duration,
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// A capability the chatbot can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the accepted parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError>;

    fn domain(&self) -> ToolDomain;
}

/// A required string parameter.
pub fn require_str<'a>(
    tool: &str,
    params: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidParameters {
            name: tool.to_string(),
            reason: format!("missing '{key}' parameter"),
        })
}

/// An optional string parameter. Blank strings count as absent.
pub fn str_param<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
