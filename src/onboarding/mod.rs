//! Onboarding progress store.
//!
//! Every user gets a fixed eight-item checklist created lazily on first
//! touch, plus an append-only history of step toggles and side requests
//! (sandbox access, dummy data). The manager is the only entry point; the
//! chat tools and the REST routes both go through it.

pub mod command;
pub mod manager;
pub mod model;
pub mod report;
pub mod routes;
pub mod ticket;

pub use command::{DummyDataCommand, StepCommand};
pub use manager::OnboardingManager;
pub use model::{ChecklistItem, HistoryEvent, HistoryKind, UserRecord};
pub use report::{ChecklistView, DummyDataReceipt, MarkOutcome, SandboxTicket};
pub use routes::{OnboardingRouteState, onboarding_routes};
