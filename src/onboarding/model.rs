//! Onboarding data models: checklist items, user records, and history events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User id substituted for an empty or missing identifier.
pub const UNKNOWN_USER: &str = "unknown";

/// The fixed onboarding template: `(id, title)` in display order.
pub const DEFAULT_CHECKLIST: &[(&str, &str)] = &[
    ("d1-setup", "Day 1: Laptop, SSO, email, chat"),
    ("join-channels", "Join team channels & calendars"),
    ("install-tools", "Install dev/tools (IDE, VPN, ticketing)"),
    ("sandbox", "Request sandbox access"),
    ("train-sec", "Security Awareness training"),
    ("train-data", "Data Protection training"),
    ("dummy", "Get dummy data in sandbox"),
    ("demo", "5-min end-of-week demo"),
];

/// Normalize a caller-supplied user id. Empty ids become [`UNKNOWN_USER`].
pub fn normalize_user_id(user_id: &str) -> &str {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        UNKNOWN_USER
    } else {
        trimmed
    }
}

/// One onboarding task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub title: String,
    pub done: bool,
}

/// What happened in a history event.
///
/// Side requests carry an `action` tag (`{"ts": .., "action": "sandbox_request",
/// "ticket": ..}`). Step toggles are written untagged as `{"ts", "step", "done"}`,
/// which is also how files from the earlier service store them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredKind", into = "StoredKind")]
pub enum HistoryKind {
    /// A checklist item was marked done or not done.
    StepToggle { step: String, done: bool },
    /// Sandbox access was requested.
    SandboxRequest { ticket: String },
    /// Dummy data was requested for the sandbox.
    DummyData {
        dataset: String,
        size: String,
        req: String,
    },
}

/// Persisted shape of [`HistoryKind`].
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StoredKind {
    Tagged(TaggedKind),
    StepToggle { step: String, done: bool },
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum TaggedKind {
    SandboxRequest {
        ticket: String,
    },
    DummyData {
        dataset: String,
        size: String,
        req: String,
    },
}

impl From<StoredKind> for HistoryKind {
    fn from(stored: StoredKind) -> Self {
        match stored {
            StoredKind::StepToggle { step, done } => Self::StepToggle { step, done },
            StoredKind::Tagged(TaggedKind::SandboxRequest { ticket }) => {
                Self::SandboxRequest { ticket }
            }
            StoredKind::Tagged(TaggedKind::DummyData { dataset, size, req }) => {
                Self::DummyData { dataset, size, req }
            }
        }
    }
}

impl From<HistoryKind> for StoredKind {
    fn from(kind: HistoryKind) -> Self {
        match kind {
            HistoryKind::StepToggle { step, done } => Self::StepToggle { step, done },
            HistoryKind::SandboxRequest { ticket } => {
                Self::Tagged(TaggedKind::SandboxRequest { ticket })
            }
            HistoryKind::DummyData { dataset, size, req } => {
                Self::Tagged(TaggedKind::DummyData { dataset, size, req })
            }
        }
    }
}

impl HistoryKind {
    /// Event kind name, used as the libSQL `action` column.
    pub fn action(&self) -> &'static str {
        match self {
            Self::StepToggle { .. } => "step_toggle",
            Self::SandboxRequest { .. } => "sandbox_request",
            Self::DummyData { .. } => "dummy_data",
        }
    }
}

/// Immutable audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    /// Unix time in seconds, fractional.
    pub ts: f64,
    #[serde(flatten)]
    pub kind: HistoryKind,
}

impl HistoryEvent {
    /// Stamp a new event with the current time.
    pub fn now(kind: HistoryKind) -> Self {
        Self::at(Utc::now(), kind)
    }

    pub fn at(when: DateTime<Utc>, kind: HistoryKind) -> Self {
        Self {
            ts: when.timestamp_micros() as f64 / 1_000_000.0,
            kind,
        }
    }
}

/// Everything the store keeps for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub checklist: Vec<ChecklistItem>,
    #[serde(default)]
    pub history: Vec<HistoryEvent>,
}

impl Default for UserRecord {
    /// A fresh record: the full template, nothing done, no history.
    fn default() -> Self {
        Self {
            checklist: DEFAULT_CHECKLIST
                .iter()
                .map(|(id, title)| ChecklistItem {
                    id: (*id).to_string(),
                    title: (*title).to_string(),
                    done: false,
                })
                .collect(),
            history: Vec::new(),
        }
    }
}

impl UserRecord {
    pub fn item(&self, step_id: &str) -> Option<&ChecklistItem> {
        self.checklist.iter().find(|item| item.id == step_id)
    }

    /// Ids of this user's checklist, in order.
    pub fn step_ids(&self) -> Vec<String> {
        self.checklist.iter().map(|item| item.id.clone()).collect()
    }

    pub fn completed(&self) -> usize {
        self.checklist.iter().filter(|item| item.done).count()
    }
}
