//! In-process backend. Nothing survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::DatabaseError;
use crate::onboarding::model::UserRecord;
use crate::store::traits::{ProgressBackend, RecordMutation, UpdatedRecord, apply_mutation};

/// Map of user id to record behind one async mutex.
#[derive(Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, UserRecord>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_or_create(&self, user_id: &str) -> Result<UserRecord, DatabaseError> {
        let mut records = self.records.lock().await;
        Ok(records.entry(user_id.to_string()).or_default().clone())
    }

    async fn update(
        &self,
        user_id: &str,
        mutation: RecordMutation,
    ) -> Result<UpdatedRecord, DatabaseError> {
        let mut records = self.records.lock().await;
        let current = records.entry(user_id.to_string()).or_default();
        let (record, outcome, _, _) = apply_mutation(current, mutation);
        *current = record.clone();
        Ok(UpdatedRecord { record, outcome })
    }

    async fn list_users(&self) -> Result<Vec<String>, DatabaseError> {
        let mut users: Vec<String> = self.records.lock().await.keys().cloned().collect();
        users.sort();
        Ok(users)
    }
}
