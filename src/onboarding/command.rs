//! Single-string command adapter.
//!
//! Tool-calling front ends that can only pass one string encode the arguments
//! as `user:step_id[:done]` or `user[:dataset[:size]]`. These parsers turn
//! that convention into structured calls on the manager.

use super::model::normalize_user_id;

/// Message returned for a malformed step command.
pub const STEP_FORMAT_HINT: &str = "Format: 'username:step_id' or 'username:step_id:done'";

/// Dataset used when a dummy-data request names none.
pub const DEFAULT_DATASET: &str = "sample_orders";
/// Size used when a dummy-data request names none.
pub const DEFAULT_SIZE: &str = "small";

/// Interpret a textual done flag. `done`, `true` and `yes` (any case) mean
/// done; every other value means not done.
pub fn parse_done(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "done" | "true" | "yes"
    )
}

/// A malformed single-string command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{hint}")]
pub struct CommandError {
    pub hint: &'static str,
}

/// Parsed `user:step_id[:done]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCommand {
    pub user_id: String,
    pub step_id: String,
    pub done: bool,
}

impl StepCommand {
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let mut parts = input.split(':');
        let user = parts.next().unwrap_or_default();
        let step = parts.next().map(str::trim).unwrap_or_default();
        if step.is_empty() {
            return Err(CommandError {
                hint: STEP_FORMAT_HINT,
            });
        }
        let done = parts.next().map(parse_done).unwrap_or(true);
        Ok(Self {
            user_id: normalize_user_id(user).to_string(),
            step_id: step.to_string(),
            done,
        })
    }
}

/// Parsed `user[:dataset[:size]]`. Never fails: every part has a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyDataCommand {
    pub user_id: String,
    pub dataset: Option<String>,
    pub size: Option<String>,
}

impl DummyDataCommand {
    pub fn parse(input: &str) -> Self {
        let mut parts = input.split(':').map(str::trim);
        let user = parts.next().unwrap_or_default();
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            user_id: normalize_user_id(user).to_string(),
            dataset: parts.next().and_then(non_empty),
            size: parts.next().and_then(non_empty),
        }
    }
}
