//! Application review with cross-track effect
//!
//! The primary status update is atomic. The two follow-on effects, retiring
//! a competing Internship-1 project when a summer application is approved
//! and re-deriving the student's internship outcome flags, each commit in
//! their own transaction and are tolerated to fail: reviewing an application
//! must never fail outright because of an unrelated project-cancellation
//! error. A best-effort failure leaves the primary change visible and a
//! possibly stale dependent record for manual admin follow-up.

use super::cascade::cancel_project;
use super::policy;
use super::TransitionEngine;
use crate::db::applications::{self, Application};
use crate::db::projects::find_cascade_projects;
use crate::db::students;
use crate::error::{EngineError, EngineResult};
use crate::types::{ApplicationStatus, ApplicationType, ProjectStatus, ProjectType};
use ptms_common::db::settings;
use uuid::Uuid;

/// Result of one review call
///
/// The secondary effects are reported independently so callers and tests can
/// assert the primary operation's success regardless of secondary outcome.
#[derive(Debug)]
pub struct ReviewOutcome {
    /// The application after the status update
    pub application: Application,
    /// Guid of the Internship-1 project retired by a summer approval, if any
    pub project_retirement: EngineResult<Option<Uuid>>,
    /// Result of re-deriving the student's internship outcome flags
    pub outcome_sync: EngineResult<()>,
}

impl TransitionEngine {
    /// Transition an application's review status
    ///
    /// Entering a terminal status stamps `verified_at`/`verified_by`. A
    /// `summer` application newly reaching `verified_pass` additionally
    /// retires the student's competing Internship-1 project (best-effort,
    /// own transaction), and the student's sem-7 internship outcome flags
    /// are re-derived from the new status (also best-effort).
    pub async fn review_application(
        &self,
        application_id: Uuid,
        new_status: &str,
        remarks: Option<String>,
        reviewer: &str,
    ) -> EngineResult<ReviewOutcome> {
        let status = ApplicationStatus::parse(new_status)
            .ok_or_else(|| EngineError::InvalidStatus(new_status.to_string()))?;

        let application = applications::load_application(&self.db, application_id)
            .await?
            .ok_or(EngineError::ApplicationNotFound(application_id))?;
        let previous_status = application.status;

        // Primary update: atomic on its own.
        let mut tx = self.db.begin().await?;
        if status.is_terminal() {
            sqlx::query(
                r#"
                UPDATE internship_applications
                SET status = ?,
                    remarks = COALESCE(?, remarks),
                    verified_at = ?,
                    verified_by = ?,
                    updated_at = CURRENT_TIMESTAMP
                WHERE guid = ?
                "#,
            )
            .bind(status.as_str())
            .bind(&remarks)
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(reviewer)
            .bind(application_id.to_string())
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                r#"
                UPDATE internship_applications
                SET status = ?,
                    remarks = COALESCE(?, remarks),
                    updated_at = CURRENT_TIMESTAMP
                WHERE guid = ?
                "#,
            )
            .bind(status.as_str())
            .bind(&remarks)
            .bind(application_id.to_string())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!(
            application_id = %application_id,
            student_id = %application.student_id,
            from = %previous_status,
            to = %status,
            reviewer,
            "Application review status updated"
        );

        // Best-effort: approval of the summer track retires the competing
        // Internship-1 project.
        let project_retirement = if application.app_type == ApplicationType::Summer
            && status == ApplicationStatus::VerifiedPass
            && previous_status != ApplicationStatus::VerifiedPass
        {
            let result = self.retire_internship1_project(application.student_id).await;
            if let Err(ref e) = result {
                tracing::error!(
                    application_id = %application_id,
                    student_id = %application.student_id,
                    error = %e,
                    "Cross-track project retirement failed; primary review stands"
                );
            }
            result
        } else {
            Ok(None)
        };

        // Best-effort: keep the sem-7 selection's outcome flags in line with
        // the review.
        let outcome_sync = self
            .sync_internship_outcome(application.student_id, status)
            .await;
        if let Err(ref e) = outcome_sync {
            tracing::error!(
                application_id = %application_id,
                student_id = %application.student_id,
                error = %e,
                "Internship outcome sync failed; primary review stands"
            );
        }

        let application = applications::load_application(&self.db, application_id)
            .await?
            .ok_or(EngineError::ApplicationNotFound(application_id))?;

        Ok(ReviewOutcome {
            application,
            project_retirement,
            outcome_sync,
        })
    }

    /// Cancel the student's live Internship-1 project, if one exists
    ///
    /// Completed projects are prior-semester data and are left alone.
    async fn retire_internship1_project(&self, student_id: Uuid) -> EngineResult<Option<Uuid>> {
        let mut tx = self.db.begin().await?;

        let projects =
            find_cascade_projects(&mut tx, student_id, &[ProjectType::Internship1]).await?;
        let mut retired = None;
        for project in &projects {
            if project.status == ProjectStatus::Completed {
                continue;
            }
            cancel_project(&mut tx, project, student_id).await?;
            retired.get_or_insert(project.guid);
        }

        tx.commit().await?;
        Ok(retired)
    }

    /// Re-derive `internship_outcome`/`has_backlog` on the sem-7 selection
    async fn sync_internship_outcome(
        &self,
        student_id: Uuid,
        status: ApplicationStatus,
    ) -> EngineResult<()> {
        let academic_year = settings::get_current_academic_year(&self.db).await?;
        let (outcome, backlog) = policy::outcome_for_status(status);

        let mut tx = self.db.begin().await?;
        let selection = students::load_selection(&mut tx, student_id, 7, &academic_year).await?;

        if let Some(selection) = selection {
            sqlx::query(
                r#"
                UPDATE track_selections
                SET internship_outcome = ?,
                    has_backlog = ?,
                    updated_at = CURRENT_TIMESTAMP
                WHERE guid = ?
                "#,
            )
            .bind(outcome.as_str())
            .bind(backlog as i64)
            .bind(selection.guid.to_string())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }
}
