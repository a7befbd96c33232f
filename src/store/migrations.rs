//! Version-tracked database migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run_migrations()` checks
//! the current version and applies only the new ones sequentially.

use libsql::Connection;

use crate::error::DatabaseError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "onboarding_schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS onboarding_users (
                user_id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS onboarding_checklist (
                user_id TEXT NOT NULL REFERENCES onboarding_users(user_id),
                position INTEGER NOT NULL,
                step_id TEXT NOT NULL,
                title TEXT NOT NULL,
                done INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (user_id, step_id)
            );
            CREATE INDEX IF NOT EXISTS idx_onboarding_checklist_order
                ON onboarding_checklist(user_id, position);

            CREATE TABLE IF NOT EXISTS onboarding_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES onboarding_users(user_id),
                ts REAL NOT NULL,
                action TEXT NOT NULL,
                event TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_onboarding_history_user
                ON onboarding_history(user_id, id);
        "#,
    },
    Migration {
        version: 2,
        name: "history_append_only",
        sql: r#"
            CREATE TRIGGER IF NOT EXISTS onboarding_history_no_update
                BEFORE UPDATE ON onboarding_history
                BEGIN SELECT RAISE(ABORT, 'onboarding history is append-only'); END;
            CREATE TRIGGER IF NOT EXISTS onboarding_history_no_delete
                BEFORE DELETE ON onboarding_history
                BEGIN SELECT RAISE(ABORT, 'onboarding history is append-only'); END;
        "#,
    },
];

/// Run all pending migrations against the given connection.
///
/// Creates the `_migrations` table if it doesn't exist.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to create _migrations table: {e}")))?;

    let current_version = get_current_version(conn).await?;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            conn.execute_batch(migration.sql).await.map_err(|e| {
                DatabaseError::Migration(format!(
                    "Migration V{} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;
            seed_version(conn, migration.version, migration.name).await?;
        }
    }

    tracing::info!(
        version = get_current_version(conn).await?,
        "Database migrations complete"
    );
    Ok(())
}

/// Get the highest applied migration version, or 0 if none.
async fn get_current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to query migration version: {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to read migration version: {e}")))?;

    match row {
        Some(row) => row.get::<i64>(0).map_err(|e| {
            DatabaseError::Migration(format!("Failed to parse migration version: {e}"))
        }),
        None => Ok(0),
    }
}

async fn seed_version(conn: &Connection, version: i64, name: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
        libsql::params![version, name],
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to record migration V{version}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_conn() -> Connection {
        let db = libsql::Builder::new_local(":memory:").build().await.unwrap();
        db.connect().unwrap()
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let conn = memory_conn().await;
        run_migrations(&conn).await.unwrap();
        run_migrations(&conn).await.unwrap();
        assert_eq!(
            get_current_version(&conn).await.unwrap(),
            MIGRATIONS.last().unwrap().version
        );
    }

    #[tokio::test]
    async fn history_rejects_updates_and_deletes() {
        let conn = memory_conn().await;
        run_migrations(&conn).await.unwrap();
        conn.execute("INSERT INTO onboarding_users (user_id) VALUES ('alice')", ())
            .await
            .unwrap();
        conn.execute(
            "INSERT INTO onboarding_history (user_id, ts, action, event) VALUES ('alice', 1.0, 'sandbox_request', '{}')",
            (),
        )
        .await
        .unwrap();

        assert!(
            conn.execute("UPDATE onboarding_history SET ts = 2.0", ())
                .await
                .is_err()
        );
        assert!(conn.execute("DELETE FROM onboarding_history", ()).await.is_err());
    }
}
