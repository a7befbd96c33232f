//! `ProgressBackend`: the storage contract behind the onboarding store.
//!
//! Backends map a user id to a [`UserRecord`]. Records come into existence
//! only through [`ProgressBackend::get_or_create`] (or the implicit creation
//! inside [`ProgressBackend::update`]); there is no delete.
//!
//! Concurrency: each `update` is one critical section (load, edit, persist)
//! and must never interleave with another `update` touching the same user.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::onboarding::model::{ChecklistItem, HistoryEvent, HistoryKind, UserRecord};

/// Whether an edit should be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Commit,
    Discard,
}

/// Restricted mutable view of a record handed to an edit.
///
/// Items can be toggled and events appended. Nothing else: the checklist
/// stays the template set and history is never rewritten.
pub struct RecordEdit<'a> {
    record: &'a mut UserRecord,
    history_len: usize,
    touched: BTreeSet<String>,
}

impl<'a> RecordEdit<'a> {
    pub fn new(record: &'a mut UserRecord) -> Self {
        let history_len = record.history.len();
        Self {
            record,
            history_len,
            touched: BTreeSet::new(),
        }
    }

    /// Set an item's done flag. Returns `None` for an unknown id.
    pub fn set_done(&mut self, step_id: &str, done: bool) -> Option<&ChecklistItem> {
        let item = self
            .record
            .checklist
            .iter_mut()
            .find(|item| item.id == step_id)?;
        item.done = done;
        self.touched.insert(step_id.to_string());
        Some(item)
    }

    /// Append an event stamped with the current time.
    pub fn append(&mut self, kind: HistoryKind) -> &HistoryEvent {
        self.record.history.push(HistoryEvent::now(kind));
        &self.record.history[self.record.history.len() - 1]
    }

    /// Events appended through this edit.
    pub fn appended(&self) -> &[HistoryEvent] {
        &self.record.history[self.history_len..]
    }

    /// Ids of items whose flag was written through this edit.
    pub fn touched(&self) -> impl Iterator<Item = &str> {
        self.touched.iter().map(String::as_str)
    }
}

/// An edit applied inside `update`'s critical section.
pub type RecordMutation = Box<dyn FnOnce(&mut RecordEdit<'_>) -> EditOutcome + Send>;

/// Box a closure as a [`RecordMutation`].
pub fn mutation<F>(f: F) -> RecordMutation
where
    F: FnOnce(&mut RecordEdit<'_>) -> EditOutcome + Send + 'static,
{
    Box::new(f)
}

/// What `update` observed.
#[derive(Debug, Clone)]
pub struct UpdatedRecord {
    /// The record after the edit (or unchanged, when discarded).
    pub record: UserRecord,
    pub outcome: EditOutcome,
}

impl UpdatedRecord {
    pub fn committed(&self) -> bool {
        self.outcome == EditOutcome::Commit
    }
}

/// Apply `mutation` to a working copy of `record`. Returns the edited copy
/// when committed, or the untouched original when discarded, along with the
/// ids of touched items and the newly appended events.
pub(crate) fn apply_mutation(
    record: &UserRecord,
    mutation: RecordMutation,
) -> (UserRecord, EditOutcome, Vec<String>, Vec<HistoryEvent>) {
    let mut working = record.clone();
    let (outcome, touched, appended) = {
        let mut edit = RecordEdit::new(&mut working);
        let outcome = mutation(&mut edit);
        let touched: Vec<String> = edit.touched().map(str::to_string).collect();
        let appended = edit.appended().to_vec();
        (outcome, touched, appended)
    };
    match outcome {
        EditOutcome::Commit => (working, outcome, touched, appended),
        EditOutcome::Discard => (record.clone(), outcome, Vec::new(), Vec::new()),
    }
}

/// Backend-agnostic onboarding progress storage.
#[async_trait]
pub trait ProgressBackend: Send + Sync {
    /// Short backend name for logs and `/health`.
    fn name(&self) -> &'static str;

    /// Fetch a user's record, creating and persisting the default record if
    /// the user has never been seen.
    async fn get_or_create(&self, user_id: &str) -> Result<UserRecord, DatabaseError>;

    /// Run `mutation` against the user's record in one critical section and
    /// persist the result when it commits.
    async fn update(
        &self,
        user_id: &str,
        mutation: RecordMutation,
    ) -> Result<UpdatedRecord, DatabaseError>;

    /// Ids of every known user, sorted.
    async fn list_users(&self) -> Result<Vec<String>, DatabaseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_tracks_touched_items_and_appended_events() {
        let mut record = UserRecord::default();
        record.history.push(HistoryEvent::now(HistoryKind::SandboxRequest {
            ticket: "SANDBOX-1".to_string(),
        }));

        let mut edit = RecordEdit::new(&mut record);
        assert!(edit.set_done("demo", true).is_some());
        assert!(edit.set_done("nope", true).is_none());
        edit.append(HistoryKind::StepToggle {
            step: "demo".to_string(),
            done: true,
        });

        assert_eq!(edit.touched().collect::<Vec<_>>(), vec!["demo"]);
        assert_eq!(edit.appended().len(), 1);
        drop(edit);
        assert_eq!(record.history.len(), 2);
    }

    #[test]
    fn discarded_mutation_leaves_record_untouched() {
        let record = UserRecord::default();
        let (after, outcome, touched, appended) = apply_mutation(
            &record,
            mutation(|edit| {
                edit.set_done("demo", true);
                edit.append(HistoryKind::StepToggle {
                    step: "demo".to_string(),
                    done: true,
                });
                EditOutcome::Discard
            }),
        );
        assert_eq!(outcome, EditOutcome::Discard);
        assert_eq!(after, record);
        assert!(touched.is_empty());
        assert!(appended.is_empty());
    }

    #[test]
    fn committed_mutation_returns_edited_copy() {
        let record = UserRecord::default();
        let (after, outcome, touched, appended) = apply_mutation(
            &record,
            mutation(|edit| {
                edit.set_done("sandbox", true);
                EditOutcome::Commit
            }),
        );
        assert_eq!(outcome, EditOutcome::Commit);
        assert_eq!(after.completed(), 1);
        assert_eq!(touched, vec!["sandbox".to_string()]);
        assert!(appended.is_empty());
        assert_eq!(record.completed(), 0);
    }
}
