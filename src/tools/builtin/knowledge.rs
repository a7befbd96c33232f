//! Knowledge tools: acronyms, topic owners, document search and the static
//! company/HR/IT answers.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;

use crate::context::ToolContext;
use crate::knowledge::{DEFAULT_DOC_LIMIT, KnowledgeBase, faq};
use crate::tools::tool::{Tool, ToolDomain, ToolError, ToolOutput, require_str, str_param};

/// The lookup term: the named parameter, else the single-string `input`.
fn term<'a>(tool: &str, params: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    match str_param(params, "input") {
        Some(input) if str_param(params, key).is_none() => Ok(input),
        _ => require_str(tool, params, key).map(str::trim),
    }
}

fn query_schema(key: &str, description: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            key: { "type": "string", "description": description }
        },
        "required": [key]
    })
}

pub struct AcronymTool {
    knowledge: Arc<KnowledgeBase>,
}

impl AcronymTool {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }
}

#[async_trait]
impl Tool for AcronymTool {
    fn name(&self) -> &str {
        "acronym_meaning"
    }

    fn description(&self) -> &str {
        "Get the meaning of company acronyms like SFSF, S4H, EC, BTP."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        query_schema("key", "The acronym to explain")
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let key = term(self.name(), &params, "key")?;
        let text = self.knowledge.acronym_meaning(key).await?;
        Ok(ToolOutput::text(text, start.elapsed()))
    }

    fn domain(&self) -> ToolDomain {
        ToolDomain::Knowledge
    }
}

pub struct WhoToAskTool {
    knowledge: Arc<KnowledgeBase>,
}

impl WhoToAskTool {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }
}

#[async_trait]
impl Tool for WhoToAskTool {
    fn name(&self) -> &str {
        "who_to_ask"
    }

    fn description(&self) -> &str {
        "Find the person/team responsible for a topic like 'dummy data', 'sandbox access', 'training'."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        query_schema("topic", "Topic to find an owner for")
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let topic = term(self.name(), &params, "topic")?;
        let text = self.knowledge.who_to_ask(topic).await?;
        Ok(ToolOutput::text(text, start.elapsed()))
    }

    fn domain(&self) -> ToolDomain {
        ToolDomain::Knowledge
    }
}

pub struct FindDocsTool {
    knowledge: Arc<KnowledgeBase>,
}

impl FindDocsTool {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }
}

#[async_trait]
impl Tool for FindDocsTool {
    fn name(&self) -> &str {
        "find_docs"
    }

    fn description(&self) -> &str {
        "Search for documentation, guides, or resources by keyword."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Keyword to search titles and tags for" },
                "limit": { "type": "integer", "description": "Maximum number of results (default 3)" }
            },
            "required": ["query"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let query = term(self.name(), &params, "query")?;
        let limit = params
            .get("limit")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_DOC_LIMIT);
        let text = self.knowledge.find_docs(query, limit).await?;
        Ok(ToolOutput::text(text, start.elapsed()))
    }

    fn domain(&self) -> ToolDomain {
        ToolDomain::Knowledge
    }
}

/// Which static answer table a [`FaqTool`] consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaqTopic {
    Company,
    Hr,
    It,
}

/// Keyword answers from the static tables in [`faq`].
pub struct FaqTool {
    topic: FaqTopic,
}

impl FaqTool {
    pub fn new(topic: FaqTopic) -> Self {
        Self { topic }
    }
}

#[async_trait]
impl Tool for FaqTool {
    fn name(&self) -> &str {
        match self.topic {
            FaqTopic::Company => "company_info",
            FaqTopic::Hr => "hr_policies",
            FaqTopic::It => "it_support",
        }
    }

    fn description(&self) -> &str {
        match self.topic {
            FaqTopic::Company => {
                "Get information about SAP company, history, products, and general company details."
            }
            FaqTopic::Hr => {
                "Retrieve HR policies, employee benefits, holiday information, working hours, and employee handbook details."
            }
            FaqTopic::It => {
                "Get IT support information, troubleshooting help, password resets, WiFi, laptop issues, and software installation."
            }
        }
    }

    fn parameters_schema(&self) -> serde_json::Value {
        query_schema("query", "The question to answer")
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let query = term(self.name(), &params, "query")?;
        let text = match self.topic {
            FaqTopic::Company => faq::company_info(query),
            FaqTopic::Hr => faq::hr_policies(query),
            FaqTopic::It => faq::it_support(query),
        };
        Ok(ToolOutput::text(text, start.elapsed()))
    }

    fn domain(&self) -> ToolDomain {
        ToolDomain::Knowledge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::ToolMetrics;

    #[tokio::test]
    async fn missing_query_is_invalid_parameters() {
        let tool = FaqTool::new(FaqTopic::Hr);
        let err = tool.execute(json!({}), &ToolContext::default()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters { .. }));
    }

    #[tokio::test]
    async fn input_string_is_accepted() {
        let tool = FaqTool::new(FaqTopic::It);
        let out = tool
            .execute(json!({"input": "forgot my password"}), &ToolContext::default())
            .await
            .unwrap();
        assert!(out.text.starts_with("To reset your password"));
    }

    #[tokio::test]
    async fn find_docs_uses_limit_param() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("docs.json"),
            r#"[{"title": "A setup", "link": "a"}, {"title": "B setup", "link": "b"}]"#,
        )
        .unwrap();
        let metrics = Arc::new(ToolMetrics::default());
        let tool = FindDocsTool::new(Arc::new(KnowledgeBase::new(dir.path(), Arc::clone(&metrics))));

        let out = tool
            .execute(json!({"query": "setup", "limit": 1}), &ToolContext::default())
            .await
            .unwrap();
        assert_eq!(out.text, "- A setup — a");
        assert_eq!(metrics.tool_calls(), 1);
    }
}
