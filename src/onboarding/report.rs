//! Structured results of the onboarding operations.
//!
//! Each type renders, through `Display`, the exact text the chat tools have
//! always returned, so anything parsing those strings keeps working.

use std::fmt;

use serde::Serialize;

use super::model::ChecklistItem;

/// A user's checklist with progress counts.
#[derive(Debug, Clone, Serialize)]
pub struct ChecklistView {
    pub user_id: String,
    pub items: Vec<ChecklistItem>,
}

impl ChecklistView {
    pub fn completed(&self) -> usize {
        self.items.iter().filter(|item| item.done).count()
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }
}

impl fmt::Display for ChecklistView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Your Onboarding Checklist:")?;
        writeln!(f)?;
        for item in &self.items {
            let marker = if item.done { "✅" } else { "⭕" };
            writeln!(f, "{} {}", marker, item.title)?;
        }
        write!(
            f,
            "\nProgress: {}/{} completed",
            self.completed(),
            self.total()
        )
    }
}

/// Result of marking a step.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MarkOutcome {
    /// The item now has the requested state.
    Marked { user_id: String, step: ChecklistItem },
    /// No item with that id; nothing was changed or recorded.
    UnknownStep {
        user_id: String,
        step_id: String,
        available: Vec<String>,
    },
}

impl MarkOutcome {
    pub fn is_marked(&self) -> bool {
        matches!(self, Self::Marked { .. })
    }
}

impl fmt::Display for MarkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Marked { step, .. } => write!(
                f,
                "✅ Step '{}' marked {}.",
                step.title,
                if step.done { "done" } else { "not done" }
            ),
            Self::UnknownStep {
                step_id, available, ..
            } => write!(
                f,
                "❌ Step '{}' not found. Available steps: {}",
                step_id,
                available.join(", ")
            ),
        }
    }
}

/// Acknowledgement of a sandbox access request.
#[derive(Debug, Clone, Serialize)]
pub struct SandboxTicket {
    pub user_id: String,
    pub ticket_id: String,
}

impl fmt::Display for SandboxTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "🎫 Sandbox access requested! Ticket: {}\n📅 Expected within 1 business day.\n💡 You'll receive an email when it's ready.",
            self.ticket_id
        )
    }
}

/// Acknowledgement of a dummy-data request.
#[derive(Debug, Clone, Serialize)]
pub struct DummyDataReceipt {
    pub user_id: String,
    pub request_id: String,
    pub dataset: String,
    pub size: String,
}

impl fmt::Display for DummyDataReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "📊 Dummy data requested!\n🎫 Request ID: {}\n📋 Dataset: {} ({})\n👤 Notifying Jean from Data Team\n⚠️  Reminder: Use sandbox only - no PII allowed!",
            self.request_id, self.dataset, self.size
        )
    }
}
