//! Shared project-cascade helper
//!
//! Every cascade site (semester track change, sub-track change, summer
//! approval retirement) resets projects through this one helper, running
//! under whatever transaction the caller holds.

use crate::db::notifications;
use crate::db::projects::Project;
use crate::error::{EngineError, EngineResult};
use crate::types::ProjectStatus;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// Cancel a project and clear its workflow state
///
/// Clears faculty, preferences, deliverables, grade, feedback, evaluation,
/// end date and submission deadline; preserves title, description, domain,
/// start date, creation time and the allocation history (audit). Returns
/// the previously allocated faculty so callers can notify them.
///
/// Cancelled rows are permanently terminal; re-entering a track later means
/// creating a fresh registration, never reviving this row.
pub(crate) async fn reset_project_progress(
    conn: &mut SqliteConnection,
    project: &Project,
) -> EngineResult<Option<Uuid>> {
    if project.status == ProjectStatus::Completed {
        return Err(EngineError::ProjectAlreadyCompleted);
    }

    sqlx::query(
        r#"
        UPDATE projects
        SET status = 'cancelled',
            faculty_id = NULL,
            faculty_preferences = '[]',
            deliverables = '[]',
            grade = NULL,
            feedback = NULL,
            evaluated_by = NULL,
            evaluated_at = NULL,
            end_date = NULL,
            submission_deadline = NULL,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(project.guid.to_string())
    .execute(&mut *conn)
    .await?;

    tracing::info!(
        project_id = %project.guid,
        project_type = %project.project_type,
        previous_status = %project.status,
        "Project progress reset (cancelled)"
    );

    Ok(project.faculty_id)
}

/// Reset a project and notify its faculty, if one was allocated
///
/// `student_id` is the transitioning student (for group projects, the member
/// whose transition triggered the cascade).
pub(crate) async fn cancel_project(
    conn: &mut SqliteConnection,
    project: &Project,
    student_id: Uuid,
) -> EngineResult<()> {
    let faculty = reset_project_progress(conn, project).await?;

    if let Some(faculty_id) = faculty {
        notifications::append_notification(
            conn,
            faculty_id,
            notifications::TYPE_PROJECT_CANCELLED,
            "Project cancelled",
            &format!(
                "Project '{}' was cancelled because of a track change",
                project.title
            ),
            Some(project.guid),
            Some(student_id),
        )
        .await?;
    }

    Ok(())
}
