//! Database pool initialization and schema creation

pub mod settings;

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Connects to the shared ptms.db in the root folder, creating the file and
/// the schema on first use.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create all PTMS tables if they don't exist
///
/// Idempotent; also used by tests against in-memory pools.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // Key/value config store (current academic year, submission windows)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            guid TEXT PRIMARY KEY,
            roll_number TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            current_semester INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One row per (student, semester, academic year). previous_track is a
    // single-slot undo buffer: set iff track_changed_by_admin_at is set.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS track_selections (
            guid TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES students(guid),
            semester INTEGER NOT NULL,
            academic_year TEXT NOT NULL,
            chosen_track TEXT NOT NULL,
            finalized_track TEXT,
            previous_track TEXT,
            track_changed_by_admin_at TEXT,
            verification_status TEXT NOT NULL DEFAULT 'pending',
            internship_outcome TEXT NOT NULL DEFAULT 'provisional',
            require_sem8_coursework INTEGER NOT NULL DEFAULT 0,
            has_backlog INTEGER NOT NULL DEFAULT 0,
            remarks TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(student_id, semester, academic_year)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS project_groups (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS group_members (
            group_id TEXT NOT NULL REFERENCES project_groups(guid),
            student_id TEXT NOT NULL REFERENCES students(guid),
            active INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (group_id, student_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Exactly one of student_id / group_id is set. allocation_history,
    // deliverables and faculty_preferences are JSON arrays.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            guid TEXT PRIMARY KEY,
            project_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'registered',
            student_id TEXT REFERENCES students(guid),
            group_id TEXT REFERENCES project_groups(guid),
            faculty_id TEXT,
            title TEXT NOT NULL,
            description TEXT,
            domain TEXT,
            start_date TEXT,
            end_date TEXT,
            submission_deadline TEXT,
            grade TEXT,
            feedback TEXT,
            evaluated_by TEXT,
            evaluated_at TEXT,
            deliverables TEXT NOT NULL DEFAULT '[]',
            allocation_history TEXT NOT NULL DEFAULT '[]',
            faculty_preferences TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK ((student_id IS NULL) != (group_id IS NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Superseding, not updating: a student may accumulate several rows of
    // the same type over time; the most recently created one is live.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS internship_applications (
            guid TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES students(guid),
            app_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'submitted',
            company_name TEXT NOT NULL,
            role TEXT,
            start_date TEXT,
            end_date TEXT,
            is_placeholder INTEGER NOT NULL DEFAULT 0,
            previous_internship1_track TEXT,
            internship1_track_changed_by_admin_at TEXT,
            verified_by TEXT,
            verified_at TEXT,
            remarks TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Append-only; never mutated by the engine after insert
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS faculty_notifications (
            guid TEXT PRIMARY KEY,
            faculty_id TEXT NOT NULL,
            notif_type TEXT NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            project_id TEXT,
            student_id TEXT,
            dismissed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_tables_is_idempotent() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        init_tables(&pool).await.unwrap();
        init_tables(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        for expected in [
            "faculty_notifications",
            "group_members",
            "internship_applications",
            "project_groups",
            "projects",
            "settings",
            "students",
            "track_selections",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
        }
    }

    #[tokio::test]
    async fn project_ownership_is_exclusive() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        init_tables(&pool).await.unwrap();

        // Neither owner set: rejected by the CHECK constraint
        let result = sqlx::query(
            "INSERT INTO projects (guid, project_type, title) VALUES ('p1', 'major1', 'T')",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }
}
