//! Faculty notification database operations
//!
//! Append-only log. The engine inserts `project_cancelled` rows as a cascade
//! side effect and never mutates them afterward; dismissal is a read-side
//! concern for the faculty dashboard.

use crate::db::students::parse_uuid;
use crate::error::EngineResult;
use serde::Serialize;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

/// Notification type emitted when a cascade cancels an allocated project
pub const TYPE_PROJECT_CANCELLED: &str = "project_cancelled";

/// Immutable faculty notification
#[derive(Debug, Clone, Serialize)]
pub struct FacultyNotification {
    pub guid: Uuid,
    pub faculty_id: Uuid,
    pub notif_type: String,
    pub title: String,
    pub message: String,
    pub project_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub dismissed: bool,
}

/// Append a notification row
pub async fn append_notification(
    conn: &mut SqliteConnection,
    faculty_id: Uuid,
    notif_type: &str,
    title: &str,
    message: &str,
    project_id: Option<Uuid>,
    student_id: Option<Uuid>,
) -> EngineResult<()> {
    sqlx::query(
        r#"
        INSERT INTO faculty_notifications (
            guid, faculty_id, notif_type, title, message, project_id, student_id,
            dismissed, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, 0, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(faculty_id.to_string())
    .bind(notif_type)
    .bind(title)
    .bind(message)
    .bind(project_id.map(|id| id.to_string()))
    .bind(student_id.map(|id| id.to_string()))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Notifications for one faculty, newest first
pub async fn list_for_faculty(
    pool: &SqlitePool,
    faculty_id: Uuid,
) -> EngineResult<Vec<FacultyNotification>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, faculty_id, notif_type, title, message, project_id, student_id, dismissed
        FROM faculty_notifications
        WHERE faculty_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(faculty_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let project_id: Option<String> = row.get("project_id");
            let student_id: Option<String> = row.get("student_id");
            let dismissed: i64 = row.get("dismissed");
            Ok(FacultyNotification {
                guid: parse_uuid(row.get("guid"))?,
                faculty_id: parse_uuid(row.get("faculty_id"))?,
                notif_type: row.get("notif_type"),
                title: row.get("title"),
                message: row.get("message"),
                project_id: project_id.map(parse_uuid).transpose()?,
                student_id: student_id.map(parse_uuid).transpose()?,
                dismissed: dismissed != 0,
            })
        })
        .collect()
}

/// Mark a notification dismissed
pub async fn dismiss_notification(pool: &SqlitePool, notification_id: Uuid) -> EngineResult<()> {
    sqlx::query("UPDATE faculty_notifications SET dismissed = 1 WHERE guid = ?")
        .bind(notification_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
