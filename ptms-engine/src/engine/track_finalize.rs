//! Semester track finalize/change (admin)

use super::cascade::cancel_project;
use super::policy;
use super::TransitionEngine;
use crate::db::projects::find_cascade_projects;
use crate::db::students::{self, TrackSelection};
use crate::error::{EngineError, EngineResult};
use crate::types::{ProjectStatus, Track, VerificationStatus};
use ptms_common::db::settings;
use uuid::Uuid;

impl TransitionEngine {
    /// Finalize or change a student's track for a semester
    ///
    /// The previous track is `finalized_track` when set, else the student's
    /// own choice (tracks auto-finalize from the choice until an admin
    /// overrides). Calling with the already-finalized track only updates the
    /// verification status and remarks: no cascade runs and the
    /// change-tracking fields stay untouched, so repeated calls are
    /// idempotent.
    ///
    /// A real change records `previous_track`/`track_changed_by_admin_at`,
    /// resets the internship outcome to provisional, applies the policy
    /// flags for `(semester, target)`, and cancels every non-cancelled,
    /// non-completed project tied to the previous track (owned directly or
    /// through an active group membership), notifying allocated faculty.
    /// All of it commits in one transaction.
    pub async fn finalize_track(
        &self,
        student_id: Uuid,
        semester: i64,
        target_track: &str,
        verification_status: Option<VerificationStatus>,
        remarks: Option<String>,
    ) -> EngineResult<TrackSelection> {
        let target = Track::parse(target_track)
            .ok_or_else(|| EngineError::InvalidTargetTrack(target_track.to_string()))?;

        let student = students::load_student(&self.db, student_id)
            .await?
            .ok_or(EngineError::StudentNotFound(student_id))?;

        let academic_year = settings::get_current_academic_year(&self.db).await?;

        let mut tx = self.db.begin().await?;

        let selection = students::load_selection(&mut tx, student_id, semester, &academic_year)
            .await?
            .ok_or_else(|| EngineError::NoChoiceSubmitted {
                semester,
                academic_year: academic_year.clone(),
            })?;

        let previous = selection.finalized_track.unwrap_or(selection.chosen_track);

        if previous == target {
            // No-op for the cascade: confirm the track, update verification
            // state only.
            sqlx::query(
                r#"
                UPDATE track_selections
                SET finalized_track = ?,
                    verification_status = ?,
                    remarks = COALESCE(?, remarks),
                    updated_at = CURRENT_TIMESTAMP
                WHERE guid = ?
                "#,
            )
            .bind(target.as_str())
            .bind(
                verification_status
                    .unwrap_or(selection.verification_status)
                    .as_str(),
            )
            .bind(&remarks)
            .bind(selection.guid.to_string())
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;

            tracing::debug!(
                student_id = %student_id,
                semester,
                track = %target,
                "Track finalize no-op (already on target track)"
            );

            return self.reload_selection(student_id, semester, &academic_year).await;
        }

        let track_policy = policy::policy_for(semester, target);
        let require_sem8 = track_policy
            .require_sem8_coursework
            .unwrap_or(selection.require_sem8_coursework);
        let has_backlog = track_policy.has_backlog.unwrap_or(selection.has_backlog);
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            UPDATE track_selections
            SET finalized_track = ?,
                previous_track = ?,
                track_changed_by_admin_at = ?,
                internship_outcome = 'provisional',
                require_sem8_coursework = ?,
                has_backlog = ?,
                verification_status = ?,
                remarks = COALESCE(?, remarks),
                updated_at = CURRENT_TIMESTAMP
            WHERE guid = ?
            "#,
        )
        .bind(target.as_str())
        .bind(previous.as_str())
        .bind(&now)
        .bind(require_sem8 as i64)
        .bind(has_backlog as i64)
        .bind(
            verification_status
                .unwrap_or(selection.verification_status)
                .as_str(),
        )
        .bind(&remarks)
        .bind(selection.guid.to_string())
        .execute(&mut *tx)
        .await?;

        // Cascade over the previous track's projects. Completed projects are
        // immutable to cascades and skipped.
        let types = policy::cascade_project_types(semester, previous);
        let projects = find_cascade_projects(&mut tx, student_id, types).await?;
        let mut cancelled = 0usize;
        for project in &projects {
            if project.status == ProjectStatus::Completed {
                continue;
            }
            cancel_project(&mut tx, project, student_id).await?;
            cancelled += 1;
        }

        tx.commit().await?;

        tracing::info!(
            student_id = %student_id,
            roll_number = %student.roll_number,
            semester,
            previous_track = %previous,
            new_track = %target,
            projects_cancelled = cancelled,
            "Track changed by admin"
        );

        self.reload_selection(student_id, semester, &academic_year).await
    }

    async fn reload_selection(
        &self,
        student_id: Uuid,
        semester: i64,
        academic_year: &str,
    ) -> EngineResult<TrackSelection> {
        let mut conn = self.db.acquire().await?;
        students::load_selection(&mut conn, student_id, semester, academic_year)
            .await?
            .ok_or_else(|| {
                EngineError::Internal("track selection vanished after update".to_string())
            })
    }
}
