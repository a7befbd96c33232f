//! OnboardingManager: the onboarding progress operations.
//!
//! Each operation is a single call into the backend, so it runs as one
//! critical section there. Unknown steps come back as data
//! ([`MarkOutcome::UnknownStep`]); only storage failures are errors.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::traits::{EditOutcome, ProgressBackend, mutation};

use super::command::{DEFAULT_DATASET, DEFAULT_SIZE};
use super::model::{HistoryEvent, HistoryKind, normalize_user_id};
use super::report::{ChecklistView, DummyDataReceipt, MarkOutcome, SandboxTicket};
use super::ticket::{TicketIssuer, TicketKind};

/// Coordinates checklist reads, step marking and side-request issuance.
pub struct OnboardingManager {
    backend: Arc<dyn ProgressBackend>,
    tickets: TicketIssuer,
}

impl OnboardingManager {
    pub fn new(backend: Arc<dyn ProgressBackend>) -> Self {
        Self {
            backend,
            tickets: TicketIssuer::new(),
        }
    }

    /// Name of the backend in use.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// The user's checklist in template order with progress counts.
    pub async fn get_checklist(&self, user_id: &str) -> Result<ChecklistView, DatabaseError> {
        let user_id = normalize_user_id(user_id);
        let record = self.backend.get_or_create(user_id).await?;
        debug!(user_id, completed = record.completed(), "Checklist read");
        Ok(ChecklistView {
            user_id: user_id.to_string(),
            items: record.checklist,
        })
    }

    /// Set a step's done flag and record the toggle.
    ///
    /// Marking an item with the state it already has still appends a history
    /// event. An unknown step id changes nothing and records nothing.
    pub async fn mark_step(
        &self,
        user_id: &str,
        step_id: &str,
        done: bool,
    ) -> Result<MarkOutcome, DatabaseError> {
        let user_id = normalize_user_id(user_id);
        let step = step_id.trim().to_string();

        let target = step.clone();
        let updated = self
            .backend
            .update(
                user_id,
                mutation(move |edit| {
                    if edit.set_done(&target, done).is_none() {
                        return EditOutcome::Discard;
                    }
                    edit.append(HistoryKind::StepToggle { step: target, done });
                    EditOutcome::Commit
                }),
            )
            .await?;

        if !updated.committed() {
            debug!(user_id, step_id = %step, "Unknown onboarding step");
            return Ok(MarkOutcome::UnknownStep {
                user_id: user_id.to_string(),
                available: updated.record.step_ids(),
                step_id: step,
            });
        }

        info!(user_id, step_id = %step, done, "Onboarding step marked");
        let item = updated
            .record
            .item(&step)
            .cloned()
            .ok_or_else(|| DatabaseError::Query(format!("step {step} vanished after update")))?;
        Ok(MarkOutcome::Marked {
            user_id: user_id.to_string(),
            step: item,
        })
    }

    /// Issue a sandbox access ticket. The "sandbox" checklist item is left
    /// alone; marking it is the caller's decision.
    pub async fn request_sandbox_access(
        &self,
        user_id: &str,
    ) -> Result<SandboxTicket, DatabaseError> {
        let user_id = normalize_user_id(user_id);
        let ticket_id = self.tickets.issue(TicketKind::Sandbox);

        let ticket = ticket_id.clone();
        self.backend
            .update(
                user_id,
                mutation(move |edit| {
                    edit.append(HistoryKind::SandboxRequest { ticket });
                    EditOutcome::Commit
                }),
            )
            .await?;

        info!(user_id, ticket_id = %ticket_id, "Sandbox access requested");
        Ok(SandboxTicket {
            user_id: user_id.to_string(),
            ticket_id,
        })
    }

    /// Issue a dummy-data request. Missing or blank dataset and size fall
    /// back to `sample_orders` / `small`.
    pub async fn request_dummy_data(
        &self,
        user_id: &str,
        dataset: Option<&str>,
        size: Option<&str>,
    ) -> Result<DummyDataReceipt, DatabaseError> {
        let user_id = normalize_user_id(user_id);
        let pick = |value: Option<&str>, default: &str| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        let dataset = pick(dataset, DEFAULT_DATASET);
        let size = pick(size, DEFAULT_SIZE);
        let request_id = self.tickets.issue(TicketKind::DummyData);

        let kind = HistoryKind::DummyData {
            dataset: dataset.clone(),
            size: size.clone(),
            req: request_id.clone(),
        };
        self.backend
            .update(
                user_id,
                mutation(move |edit| {
                    edit.append(kind);
                    EditOutcome::Commit
                }),
            )
            .await?;

        info!(user_id, request_id = %request_id, dataset = %dataset, size = %size, "Dummy data requested");
        Ok(DummyDataReceipt {
            user_id: user_id.to_string(),
            request_id,
            dataset,
            size,
        })
    }

    /// The user's audit history, oldest first.
    pub async fn history(&self, user_id: &str) -> Result<Vec<HistoryEvent>, DatabaseError> {
        let user_id = normalize_user_id(user_id);
        Ok(self.backend.get_or_create(user_id).await?.history)
    }

    /// Every user the store has seen.
    pub async fn users(&self) -> Result<Vec<String>, DatabaseError> {
        self.backend.list_users().await
    }
}
