//! Internship-1 sub-track change (project ↔ application)
//!
//! Applies to coursework students in semester 7, who choose between an
//! institute-faculty project and an external/summer-style application. The
//! current sub-track is derived from the records on every call, never
//! stored: a live Internship-1 project means `project`, else an existing
//! summer application means `application`, else no sub-track yet.

use super::cascade::cancel_project;
use super::TransitionEngine;
use crate::db::applications::{
    self, Application, MARKER_COMPANY, PENDING_COMPANY,
};
use crate::db::projects::find_cascade_projects;
use crate::db::students;
use crate::error::{EngineError, EngineResult};
use crate::types::{ApplicationStatus, Internship1Track, ProjectStatus, ProjectType};
use uuid::Uuid;

impl TransitionEngine {
    /// Move a student between the Internship-1 project and application
    /// sub-tracks
    ///
    /// One transaction covers the whole cascade:
    /// - `→ application`: the live Internship-1 project (if any) is reset.
    ///   With no summer application on file a placeholder `submitted` row is
    ///   created; a terminally rejected latest application is superseded by
    ///   a fresh `submitted` row (the old row stays untouched as history);
    ///   a non-terminal one is reopened to `submitted`.
    /// - `→ project`: every open summer application is rejected
    ///   (`verified_fail`). An already-terminal latest application keeps its
    ///   status but still gets the change-tracking stamp. With no
    ///   application at all, a marker row is inserted (`verified_fail`
    ///   with placeholder details) meaning "assigned to the project
    ///   sub-track, not yet registered".
    ///
    /// A completed Internship-1 project blocks the change outright: that
    /// project type only completes across a semester boundary, so a match
    /// here is stale prior-semester data that must not be touched.
    pub async fn change_internship1_track(
        &self,
        student_id: Uuid,
        target_track: &str,
        remarks: Option<String>,
    ) -> EngineResult<()> {
        let target = Internship1Track::parse(target_track)
            .ok_or_else(|| EngineError::InvalidTargetTrack(target_track.to_string()))?;

        students::load_student(&self.db, student_id)
            .await?
            .ok_or(EngineError::StudentNotFound(student_id))?;

        let mut tx = self.db.begin().await?;

        let i1_projects =
            find_cascade_projects(&mut tx, student_id, &[ProjectType::Internship1]).await?;
        if i1_projects
            .iter()
            .any(|p| p.status == ProjectStatus::Completed)
        {
            return Err(EngineError::ProjectAlreadyCompleted);
        }

        let current_project = i1_projects.first();
        let latest_app = applications::latest_summer_application(&mut tx, student_id).await?;

        // Recomputed on every call; this is what gets stamped as the
        // previous sub-track.
        let current_state = if current_project.is_some() {
            Some(Internship1Track::Project)
        } else if latest_app.is_some() {
            Some(Internship1Track::Application)
        } else {
            None
        };

        let old_label = current_state.map(|s| s.as_str()).unwrap_or("none");
        let remark = remarks.unwrap_or_else(|| {
            format!("Internship 1 track changed from {} to {}", old_label, target)
        });
        let now = chrono::Utc::now().to_rfc3339();

        match target {
            Internship1Track::Application => {
                for project in &i1_projects {
                    cancel_project(&mut tx, project, student_id).await?;
                }

                match &latest_app {
                    None => {
                        let mut app = Application::placeholder(
                            student_id,
                            ApplicationStatus::Submitted,
                            PENDING_COMPANY,
                        );
                        app.previous_internship1_track = current_state;
                        app.internship1_track_changed_by_admin_at = Some(now);
                        app.remarks = Some(remark);
                        applications::insert_application(&mut tx, &app).await?;
                    }
                    Some(app) if app.status.is_terminal() => {
                        // Supersede: the rejected row is history and must
                        // never be mutated by a new transition.
                        let mut fresh = Application::placeholder(
                            student_id,
                            ApplicationStatus::Submitted,
                            PENDING_COMPANY,
                        );
                        fresh.previous_internship1_track = current_state;
                        fresh.internship1_track_changed_by_admin_at = Some(now);
                        fresh.remarks = Some(remark);
                        applications::insert_application(&mut tx, &fresh).await?;
                    }
                    Some(app) => {
                        sqlx::query(
                            r#"
                            UPDATE internship_applications
                            SET status = 'submitted',
                                previous_internship1_track = ?,
                                internship1_track_changed_by_admin_at = ?,
                                remarks = ?,
                                updated_at = CURRENT_TIMESTAMP
                            WHERE guid = ?
                            "#,
                        )
                        .bind(current_state.map(|s| s.as_str()))
                        .bind(&now)
                        .bind(&remark)
                        .bind(app.guid.to_string())
                        .execute(&mut *tx)
                        .await?;
                    }
                }
            }

            Internship1Track::Project => {
                let open = applications::open_summer_applications(&mut tx, student_id).await?;

                if !open.is_empty() {
                    for app in &open {
                        sqlx::query(
                            r#"
                            UPDATE internship_applications
                            SET status = 'verified_fail',
                                previous_internship1_track = ?,
                                internship1_track_changed_by_admin_at = ?,
                                remarks = ?,
                                updated_at = CURRENT_TIMESTAMP
                            WHERE guid = ?
                            "#,
                        )
                        .bind(current_state.map(|s| s.as_str()))
                        .bind(&now)
                        .bind(&remark)
                        .bind(app.guid.to_string())
                        .execute(&mut *tx)
                        .await?;
                    }
                } else if let Some(app) = &latest_app {
                    // Already terminal: keep the status, stamp the change so
                    // the audit trail stays continuous.
                    sqlx::query(
                        r#"
                        UPDATE internship_applications
                        SET previous_internship1_track = ?,
                            internship1_track_changed_by_admin_at = ?,
                            remarks = ?,
                            updated_at = CURRENT_TIMESTAMP
                        WHERE guid = ?
                        "#,
                    )
                    .bind(current_state.map(|s| s.as_str()))
                    .bind(&now)
                    .bind(&remark)
                    .bind(app.guid.to_string())
                    .execute(&mut *tx)
                    .await?;
                } else {
                    // No application exists: the marker row stands in for
                    // "assigned to project track, not yet registered".
                    let mut marker = Application::placeholder(
                        student_id,
                        ApplicationStatus::VerifiedFail,
                        MARKER_COMPANY,
                    );
                    marker.previous_internship1_track = current_state;
                    marker.internship1_track_changed_by_admin_at = Some(now);
                    marker.remarks = Some(remark);
                    applications::insert_application(&mut tx, &marker).await?;
                }
            }
        }

        tx.commit().await?;

        tracing::info!(
            student_id = %student_id,
            from = old_label,
            to = %target,
            "Internship 1 sub-track changed"
        );

        Ok(())
    }
}
