//! Built-in tools.

mod knowledge;
mod onboarding;

pub use knowledge::{AcronymTool, FaqTool, FaqTopic, FindDocsTool, WhoToAskTool};
pub use onboarding::{DummyDataTool, GetChecklistTool, MarkStepTool, SandboxAccessTool};
