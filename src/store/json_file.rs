//! JSON document backend.
//!
//! The whole store is one pretty-printed JSON object keyed by user id:
//!
//! ```json
//! { "alice": { "checklist": [ {"id": "d1-setup", "title": "...", "done": false} ],
//!              "history":   [ {"ts": 1718000000.123, "step": "d1-setup", "done": true},
//!                             {"ts": 1718000042.5, "action": "sandbox_request", "ticket": "SANDBOX-..."} ] } }
//! ```
//!
//! Every operation holds the store-wide lock across read, edit and write, so
//! concurrent updates are strictly serialized. Writes land in a temp sibling
//! that is synced and renamed over the target.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::onboarding::model::UserRecord;
use crate::store::traits::{
    EditOutcome, ProgressBackend, RecordMutation, UpdatedRecord, apply_mutation,
};

type StoreDocument = BTreeMap<String, UserRecord>;

pub struct JsonFileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileBackend {
    /// Use `path` as the store file. The file and its parent directories are
    /// created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!(path = %path.display(), "JSON onboarding store");
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> DatabaseError {
        DatabaseError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// Read the document. A missing or empty file is an empty store.
    async fn load(&self) -> Result<StoreDocument, DatabaseError> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreDocument::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if text.trim().is_empty() {
            return Ok(StoreDocument::new());
        }
        serde_json::from_str(&text).map_err(|e| {
            DatabaseError::Serialization(format!("{}: {e}", self.path.display()))
        })
    }

    async fn save(&self, doc: &StoreDocument) -> Result<(), DatabaseError> {
        let json = serde_json::to_string_pretty(doc)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).await.map_err(|e| self.io_error(e))?;
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.sync_all().await.map_err(|e| self.io_error(e))?;
        drop(file);
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), users = doc.len(), "Store written");
        Ok(())
    }
}

#[async_trait]
impl ProgressBackend for JsonFileBackend {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn get_or_create(&self, user_id: &str) -> Result<UserRecord, DatabaseError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        if let Some(record) = doc.get(user_id) {
            return Ok(record.clone());
        }
        let record = UserRecord::default();
        doc.insert(user_id.to_string(), record.clone());
        self.save(&doc).await?;
        info!(user_id, "Onboarding record created");
        Ok(record)
    }

    async fn update(
        &self,
        user_id: &str,
        mutation: RecordMutation,
    ) -> Result<UpdatedRecord, DatabaseError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let created = !doc.contains_key(user_id);
        let current = doc.entry(user_id.to_string()).or_default();
        let (record, outcome, _, _) = apply_mutation(current, mutation);

        if outcome == EditOutcome::Commit || created {
            *current = record.clone();
            self.save(&doc).await?;
            if created {
                info!(user_id, "Onboarding record created");
            }
        }

        Ok(UpdatedRecord { record, outcome })
    }

    async fn list_users(&self) -> Result<Vec<String>, DatabaseError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_keys().collect())
    }
}
