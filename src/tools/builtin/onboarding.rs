//! Onboarding tools: checklist, step marking, sandbox and dummy-data requests.
//!
//! Every tool takes structured parameters. For front ends that can only pass
//! one string, an `input` parameter in the `user:step_id[:done]` /
//! `user[:dataset[:size]]` form is accepted instead.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;

use crate::context::ToolContext;
use crate::onboarding::OnboardingManager;
use crate::onboarding::command::{DummyDataCommand, STEP_FORMAT_HINT, StepCommand, parse_done};
use crate::onboarding::model::UNKNOWN_USER;
use crate::tools::tool::{Tool, ToolDomain, ToolError, ToolOutput, str_param};

/// User named by the parameters, else the caller, else `unknown`.
fn resolve_user(params: &serde_json::Value, ctx: &ToolContext) -> String {
    str_param(params, "user")
        .or_else(|| str_param(params, "input"))
        .or(ctx.user_id.as_deref())
        .unwrap_or(UNKNOWN_USER)
        .to_string()
}

fn user_schema(extra: serde_json::Value) -> serde_json::Value {
    let mut properties = json!({
        "user": {
            "type": "string",
            "description": "Username or email of the new joiner (defaults to the caller)"
        }
    });
    if let (Some(base), Some(more)) = (properties.as_object_mut(), extra.as_object()) {
        base.extend(more.clone());
    }
    json!({ "type": "object", "properties": properties })
}

pub struct GetChecklistTool {
    manager: Arc<OnboardingManager>,
}

impl GetChecklistTool {
    pub fn new(manager: Arc<OnboardingManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for GetChecklistTool {
    fn name(&self) -> &str {
        "get_onboarding_checklist"
    }

    fn description(&self) -> &str {
        "Get a new employee's onboarding checklist and progress. Use their username/email."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        user_schema(json!({}))
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let user = resolve_user(&params, ctx);
        let view = self.manager.get_checklist(&user).await?;
        let data = json!({
            "user_id": view.user_id,
            "items": view.items,
            "completed": view.completed(),
            "total": view.total(),
        });
        Ok(ToolOutput::success(view.to_string(), data, start.elapsed()))
    }

    fn domain(&self) -> ToolDomain {
        ToolDomain::Onboarding
    }
}

pub struct MarkStepTool {
    manager: Arc<OnboardingManager>,
}

impl MarkStepTool {
    pub fn new(manager: Arc<OnboardingManager>) -> Self {
        Self { manager }
    }

    /// Structured fields first, then the composite `input` string.
    fn command(params: &serde_json::Value, ctx: &ToolContext) -> Option<StepCommand> {
        if let Some(step_id) = str_param(params, "step_id") {
            let done = match params.get("done") {
                Some(serde_json::Value::Bool(b)) => *b,
                Some(serde_json::Value::String(s)) => parse_done(s),
                Some(_) => false,
                None => true,
            };
            let user = str_param(params, "user")
                .or(ctx.user_id.as_deref())
                .unwrap_or(UNKNOWN_USER);
            return Some(StepCommand {
                user_id: user.to_string(),
                step_id: step_id.to_string(),
                done,
            });
        }
        str_param(params, "input").and_then(|input| StepCommand::parse(input).ok())
    }
}

#[async_trait]
impl Tool for MarkStepTool {
    fn name(&self) -> &str {
        "mark_onboarding_step"
    }

    fn description(&self) -> &str {
        "Mark an onboarding step as complete (or not). Step ids look like 'd1-setup', \
         'sandbox', 'demo'. Legacy single-string form: 'username:step_id[:done]'."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        user_schema(json!({
            "step_id": {
                "type": "string",
                "description": "Checklist step id, e.g. 'sandbox'"
            },
            "done": {
                "type": ["boolean", "string"],
                "description": "true/'done'/'yes' marks done, anything else marks not done (default: true)"
            },
            "input": {
                "type": "string",
                "description": "Legacy form 'username:step_id' or 'username:step_id:done'"
            }
        }))
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let Some(cmd) = Self::command(&params, ctx) else {
            return Ok(ToolOutput::text(STEP_FORMAT_HINT, start.elapsed()));
        };
        let outcome = self
            .manager
            .mark_step(&cmd.user_id, &cmd.step_id, cmd.done)
            .await?;
        let data = serde_json::to_value(&outcome).map_err(|e| ToolError::ExecutionFailed {
            name: self.name().to_string(),
            reason: e.to_string(),
        })?;
        Ok(ToolOutput::success(outcome.to_string(), data, start.elapsed()))
    }

    fn domain(&self) -> ToolDomain {
        ToolDomain::Onboarding
    }
}

pub struct SandboxAccessTool {
    manager: Arc<OnboardingManager>,
}

impl SandboxAccessTool {
    pub fn new(manager: Arc<OnboardingManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for SandboxAccessTool {
    fn name(&self) -> &str {
        "request_sandbox_access"
    }

    fn description(&self) -> &str {
        "Request sandbox/development environment access for a new employee. Use their username."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        user_schema(json!({}))
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let user = resolve_user(&params, ctx);
        let ticket = self.manager.request_sandbox_access(&user).await?;
        let data = json!({ "user_id": ticket.user_id, "ticket_id": ticket.ticket_id });
        Ok(ToolOutput::success(ticket.to_string(), data, start.elapsed()))
    }

    fn domain(&self) -> ToolDomain {
        ToolDomain::Onboarding
    }
}

pub struct DummyDataTool {
    manager: Arc<OnboardingManager>,
}

impl DummyDataTool {
    pub fn new(manager: Arc<OnboardingManager>) -> Self {
        Self { manager }
    }

    fn command(params: &serde_json::Value, ctx: &ToolContext) -> DummyDataCommand {
        let structured = ["user", "dataset", "size"]
            .iter()
            .any(|key| str_param(params, key).is_some());
        if !structured && let Some(input) = str_param(params, "input") {
            return DummyDataCommand::parse(input);
        }
        DummyDataCommand {
            user_id: resolve_user(params, ctx),
            dataset: str_param(params, "dataset").map(str::to_string),
            size: str_param(params, "size").map(str::to_string),
        }
    }
}

#[async_trait]
impl Tool for DummyDataTool {
    fn name(&self) -> &str {
        "request_dummy_data"
    }

    fn description(&self) -> &str {
        "Request dummy/test data for the sandbox environment. Legacy single-string form: \
         'username' or 'username:dataset:size'."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        user_schema(json!({
            "dataset": {
                "type": "string",
                "description": "Dataset name (default: sample_orders)"
            },
            "size": {
                "type": "string",
                "description": "Dataset size (default: small)"
            },
            "input": {
                "type": "string",
                "description": "Legacy form 'username' or 'username:dataset:size'"
            }
        }))
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let cmd = Self::command(&params, ctx);
        let receipt = self
            .manager
            .request_dummy_data(&cmd.user_id, cmd.dataset.as_deref(), cmd.size.as_deref())
            .await?;
        let data = json!({
            "user_id": receipt.user_id,
            "request_id": receipt.request_id,
            "dataset": receipt.dataset,
            "size": receipt.size,
        });
        Ok(ToolOutput::success(receipt.to_string(), data, start.elapsed()))
    }

    fn domain(&self) -> ToolDomain {
        ToolDomain::Onboarding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    fn manager() -> Arc<OnboardingManager> {
        Arc::new(OnboardingManager::new(Arc::new(MemoryBackend::new())))
    }

    #[tokio::test]
    async fn checklist_falls_back_to_context_user() {
        let mgr = manager();
        let tool = GetChecklistTool::new(Arc::clone(&mgr));
        let out = tool
            .execute(json!({}), &ToolContext::for_user("carol"))
            .await
            .unwrap();
        assert!(out.text.starts_with("Your Onboarding Checklist:"));
        assert_eq!(out.data.unwrap()["user_id"], "carol");
        assert_eq!(mgr.users().await.unwrap(), vec!["carol"]);
    }

    #[tokio::test]
    async fn mark_step_structured_and_legacy() {
        let mgr = manager();
        let tool = MarkStepTool::new(Arc::clone(&mgr));
        let ctx = ToolContext::default();

        let out = tool
            .execute(json!({"user": "alice", "step_id": "demo"}), &ctx)
            .await
            .unwrap();
        assert_eq!(out.text, "✅ Step '5-min end-of-week demo' marked done.");

        let out = tool
            .execute(json!({"input": "alice:demo:nope"}), &ctx)
            .await
            .unwrap();
        assert_eq!(out.text, "✅ Step '5-min end-of-week demo' marked not done.");
        assert_eq!(mgr.history("alice").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn explicit_non_true_done_marks_not_done() {
        let mgr = manager();
        let tool = MarkStepTool::new(Arc::clone(&mgr));
        let ctx = ToolContext::for_user("alice");
        for done in [json!(null), json!(0), json!(1), json!(["done"])] {
            mgr.mark_step("alice", "sandbox", true).await.unwrap();
            let out = tool
                .execute(json!({"step_id": "sandbox", "done": done}), &ctx)
                .await
                .unwrap();
            assert_eq!(out.text, "✅ Step 'Request sandbox access' marked not done.");
        }
        let out = tool
            .execute(json!({"step_id": "sandbox"}), &ctx)
            .await
            .unwrap();
        assert_eq!(out.text, "✅ Step 'Request sandbox access' marked done.");
    }

    #[tokio::test]
    async fn mark_step_bad_input_is_format_hint() {
        let mgr = manager();
        let tool = MarkStepTool::new(Arc::clone(&mgr));
        let out = tool
            .execute(json!({"input": "alice"}), &ToolContext::default())
            .await
            .unwrap();
        assert_eq!(out.text, STEP_FORMAT_HINT);
        assert!(mgr.users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mark_step_unknown_id_lists_available() {
        let tool = MarkStepTool::new(manager());
        let out = tool
            .execute(
                json!({"user": "alice", "step_id": "nope", "done": "yes"}),
                &ToolContext::default(),
            )
            .await
            .unwrap();
        assert!(out.text.starts_with("❌ Step 'nope' not found. Available steps: d1-setup, "));
        assert_eq!(out.data.unwrap()["status"], "unknown_step");
    }

    #[tokio::test]
    async fn sandbox_ticket_text() {
        let tool = SandboxAccessTool::new(manager());
        let out = tool
            .execute(json!({"input": "bob"}), &ToolContext::default())
            .await
            .unwrap();
        let data = out.data.unwrap();
        assert_eq!(data["user_id"], "bob");
        let ticket = data["ticket_id"].as_str().unwrap();
        assert!(out.text.contains(&format!("Ticket: {ticket}")));
    }

    #[tokio::test]
    async fn dummy_data_legacy_and_structured() {
        let mgr = manager();
        let tool = DummyDataTool::new(Arc::clone(&mgr));
        let ctx = ToolContext::default();

        let out = tool
            .execute(json!({"input": "dave:customers:large"}), &ctx)
            .await
            .unwrap();
        assert!(out.text.contains("📋 Dataset: customers (large)"));

        let out = tool
            .execute(json!({"user": "dave", "size": "medium"}), &ctx)
            .await
            .unwrap();
        assert!(out.text.contains("📋 Dataset: sample_orders (medium)"));
        assert_eq!(mgr.history("dave").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn no_user_anywhere_is_unknown() {
        let mgr = manager();
        let tool = DummyDataTool::new(Arc::clone(&mgr));
        tool.execute(json!({}), &ToolContext::default()).await.unwrap();
        assert_eq!(mgr.users().await.unwrap(), vec![UNKNOWN_USER]);
    }
}
