//! Request context passed to tool execution.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Who is calling a tool, and from which session.
#[derive(Debug, Clone, Serialize)]
pub struct ToolContext {
    /// Unique id of this invocation's session.
    pub session_id: Uuid,
    /// Chat user on whose behalf the tool runs, if known. Onboarding tools
    /// fall back to it when the parameters name no user.
    pub user_id: Option<String>,
    /// When the context was created.
    pub created_at: DateTime<Utc>,
}

impl Default for ToolContext {
    fn default() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id: None,
            created_at: Utc::now(),
        }
    }
}

impl ToolContext {
    /// Context for a known chat user.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }
}
