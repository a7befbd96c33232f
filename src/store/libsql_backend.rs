//! libSQL backend with a row per checklist item and per history event.
//!
//! Supports local file and in-memory databases. All writes go through one
//! gate and run inside a single transaction, so an operation either lands
//! completely or not at all.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, Transaction, params};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::error::DatabaseError;
use crate::onboarding::model::{ChecklistItem, HistoryEvent, UserRecord};
use crate::store::migrations;
use crate::store::traits::{
    EditOutcome, ProgressBackend, RecordMutation, UpdatedRecord, apply_mutation,
};

/// libSQL database backend.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    /// Serializes write transactions on the shared connection.
    write_gate: Mutex<()>,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
            write_gate: Mutex::new(()),
        })
    }

    /// Take the write gate and open a transaction.
    async fn begin(&self) -> Result<(MutexGuard<'_, ()>, Transaction), DatabaseError> {
        let gate = self.write_gate.lock().await;
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DatabaseError::Query(format!("begin transaction: {e}")))?;
        Ok((gate, tx))
    }
}

/// Commit when `result` is Ok, roll back otherwise.
async fn finish<T>(
    tx: Transaction,
    result: Result<T, DatabaseError>,
) -> Result<T, DatabaseError> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| DatabaseError::Query(format!("commit: {e}")))?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "Rollback failed");
            }
            Err(e)
        }
    }
}

// ── Helper functions ────────────────────────────────────────────────

async fn user_exists(conn: &Connection, user_id: &str) -> Result<bool, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT 1 FROM onboarding_users WHERE user_id = ?1",
            params![user_id],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("user_exists: {e}")))?;
    match rows.next().await {
        Ok(row) => Ok(row.is_some()),
        Err(e) => Err(DatabaseError::Query(format!("user_exists: {e}"))),
    }
}

/// Insert the user row plus the full default checklist.
async fn insert_user(conn: &Connection, user_id: &str) -> Result<(), DatabaseError> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO onboarding_users (user_id, created_at) VALUES (?1, ?2)",
        params![user_id, now.clone()],
    )
    .await
    .map_err(|e| DatabaseError::Query(format!("insert_user: {e}")))?;

    for (position, item) in UserRecord::default().checklist.iter().enumerate() {
        conn.execute(
            "INSERT INTO onboarding_checklist (user_id, position, step_id, title, done, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![
                user_id,
                position as i64,
                item.id.as_str(),
                item.title.as_str(),
                now.clone()
            ],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("insert_user checklist: {e}")))?;
    }
    info!(user_id, "Onboarding record created");
    Ok(())
}

async fn load_record(conn: &Connection, user_id: &str) -> Result<UserRecord, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT step_id, title, done FROM onboarding_checklist
             WHERE user_id = ?1 ORDER BY position",
            params![user_id],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("load checklist: {e}")))?;

    let mut checklist = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Query(format!("load checklist: {e}")))?
    {
        checklist.push(ChecklistItem {
            id: row
                .get::<String>(0)
                .map_err(|e| DatabaseError::Query(format!("checklist step_id: {e}")))?,
            title: row
                .get::<String>(1)
                .map_err(|e| DatabaseError::Query(format!("checklist title: {e}")))?,
            done: row
                .get::<i64>(2)
                .map_err(|e| DatabaseError::Query(format!("checklist done: {e}")))?
                != 0,
        });
    }

    let mut rows = conn
        .query(
            "SELECT event FROM onboarding_history WHERE user_id = ?1 ORDER BY id",
            params![user_id],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("load history: {e}")))?;

    let mut history = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Query(format!("load history: {e}")))?
    {
        let raw: String = row
            .get(0)
            .map_err(|e| DatabaseError::Query(format!("history event: {e}")))?;
        let event: HistoryEvent = serde_json::from_str(&raw)
            .map_err(|e| DatabaseError::Serialization(format!("history event: {e}")))?;
        history.push(event);
    }

    Ok(UserRecord { checklist, history })
}

async fn write_step(
    conn: &Connection,
    user_id: &str,
    item: &ChecklistItem,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE onboarding_checklist SET done = ?1, updated_at = ?2
         WHERE user_id = ?3 AND step_id = ?4",
        params![
            item.done as i64,
            Utc::now().to_rfc3339(),
            user_id,
            item.id.as_str()
        ],
    )
    .await
    .map_err(|e| DatabaseError::Query(format!("write_step: {e}")))?;
    Ok(())
}

async fn append_event(
    conn: &Connection,
    user_id: &str,
    event: &HistoryEvent,
) -> Result<(), DatabaseError> {
    let json =
        serde_json::to_string(event).map_err(|e| DatabaseError::Serialization(e.to_string()))?;
    conn.execute(
        "INSERT INTO onboarding_history (user_id, ts, action, event) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, event.ts, event.kind.action(), json],
    )
    .await
    .map_err(|e| DatabaseError::Query(format!("append_event: {e}")))?;
    Ok(())
}

#[async_trait]
impl ProgressBackend for LibSqlBackend {
    fn name(&self) -> &'static str {
        "libsql"
    }

    async fn get_or_create(&self, user_id: &str) -> Result<UserRecord, DatabaseError> {
        let (_gate, tx) = self.begin().await?;
        let result = async {
            if !user_exists(&tx, user_id).await? {
                insert_user(&tx, user_id).await?;
            }
            load_record(&tx, user_id).await
        }
        .await;
        finish(tx, result).await
    }

    async fn update(
        &self,
        user_id: &str,
        mutation: RecordMutation,
    ) -> Result<UpdatedRecord, DatabaseError> {
        let (_gate, tx) = self.begin().await?;
        let result = async {
            if !user_exists(&tx, user_id).await? {
                insert_user(&tx, user_id).await?;
            }
            let current = load_record(&tx, user_id).await?;
            let (record, outcome, touched, appended) = apply_mutation(&current, mutation);

            if outcome == EditOutcome::Commit {
                for step_id in &touched {
                    if let Some(item) = record.item(step_id) {
                        write_step(&tx, user_id, item).await?;
                    }
                }
                for event in &appended {
                    append_event(&tx, user_id, event).await?;
                }
                debug!(
                    user_id,
                    steps = touched.len(),
                    events = appended.len(),
                    "Onboarding edit committed"
                );
            }

            Ok(UpdatedRecord { record, outcome })
        }
        .await;
        finish(tx, result).await
    }

    async fn list_users(&self) -> Result<Vec<String>, DatabaseError> {
        let _gate = self.write_gate.lock().await;
        let mut rows = self
            .conn
            .query("SELECT user_id FROM onboarding_users ORDER BY user_id", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("list_users: {e}")))?;
        let mut users = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_users: {e}")))?
        {
            users.push(
                row.get::<String>(0)
                    .map_err(|e| DatabaseError::Query(format!("list_users: {e}")))?,
            );
        }
        Ok(users)
    }
}
