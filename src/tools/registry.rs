//! Tool registry for managing available tools.

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::ToolContext;
use crate::knowledge::KnowledgeBase;
use crate::onboarding::OnboardingManager;
use crate::tools::builtin::{
    AcronymTool, DummyDataTool, FaqTool, FaqTopic, FindDocsTool, GetChecklistTool, MarkStepTool,
    SandboxAccessTool, WhoToAskTool,
};
use crate::tools::tool::{Tool, ToolDefinition, ToolError, ToolOutput};

fn definition(tool: &Arc<dyn Tool>) -> ToolDefinition {
    ToolDefinition {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        parameters: tool.parameters_schema(),
        domain: tool.domain(),
    }
}

/// Registry of available tools. Filled at startup, then shared read-only.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. A later tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "Replaced previously registered tool");
        } else {
            tracing::debug!("Registered tool: {}", name);
        }
    }

    /// Register the four onboarding tools over `manager`.
    pub fn register_onboarding_tools(&mut self, manager: Arc<OnboardingManager>) {
        self.register(Arc::new(GetChecklistTool::new(Arc::clone(&manager))));
        self.register(Arc::new(MarkStepTool::new(Arc::clone(&manager))));
        self.register(Arc::new(SandboxAccessTool::new(Arc::clone(&manager))));
        self.register(Arc::new(DummyDataTool::new(manager)));
    }

    /// Register the lookup and static-answer tools.
    pub fn register_knowledge_tools(&mut self, knowledge: Arc<KnowledgeBase>) {
        self.register(Arc::new(AcronymTool::new(Arc::clone(&knowledge))));
        self.register(Arc::new(WhoToAskTool::new(Arc::clone(&knowledge))));
        self.register(Arc::new(FindDocsTool::new(knowledge)));
        for topic in [FaqTopic::Company, FaqTopic::Hr, FaqTopic::It] {
            self.register(Arc::new(FaqTool::new(topic)));
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all tool names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the number of registered tools.
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Definitions of every tool, sorted by name.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(definition).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Look up a tool by name and run it.
    pub async fn execute(
        &self,
        name: &str,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::NotFound {
            name: name.to_string(),
        })?;
        let result = tool.execute(params, ctx).await;
        match &result {
            Ok(out) => tracing::debug!(tool = name, elapsed_ms = out.duration.as_millis() as u64, "Tool executed"),
            Err(e) => tracing::warn!(tool = name, error = %e, "Tool failed"),
        }
        result
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
