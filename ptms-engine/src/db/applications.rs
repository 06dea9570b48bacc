//! Internship application database operations
//!
//! Applications supersede rather than update: when the latest row is
//! terminally rejected, a new transition creates a fresh row and leaves the
//! old one as history. The most recently created `summer` application per
//! student is the authoritative one.

use crate::db::students::parse_uuid;
use crate::error::{EngineError, EngineResult};
use crate::types::{ApplicationStatus, ApplicationType, Internship1Track};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

/// Company name on placeholder rows created when assigning a student to the
/// project sub-track before any real application exists
pub const MARKER_COMPANY: &str = "N/A - Assigned to Internship 1 Project";

/// Company name on placeholder rows created when assigning the application
/// sub-track before the student has submitted details
pub const PENDING_COMPANY: &str = "N/A - Pending Submission";

/// Internship application record
///
/// `is_placeholder` distinguishes administrative marker rows from genuine
/// student submissions; the observable status values stay the same either
/// way (a marker is a `verified_fail` row with placeholder details).
#[derive(Debug, Clone, Serialize)]
pub struct Application {
    pub guid: Uuid,
    pub student_id: Uuid,
    pub app_type: ApplicationType,
    pub status: ApplicationStatus,
    pub company_name: String,
    pub role: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_placeholder: bool,
    pub previous_internship1_track: Option<Internship1Track>,
    pub internship1_track_changed_by_admin_at: Option<String>,
    pub verified_by: Option<String>,
    pub verified_at: Option<String>,
    pub remarks: Option<String>,
    pub created_at: String,
}

impl Application {
    /// New student-submitted application
    pub fn new(student_id: Uuid, app_type: ApplicationType, company_name: String) -> Self {
        Self {
            guid: Uuid::new_v4(),
            student_id,
            app_type,
            status: ApplicationStatus::Submitted,
            company_name,
            role: None,
            start_date: None,
            end_date: None,
            is_placeholder: false,
            previous_internship1_track: None,
            internship1_track_changed_by_admin_at: None,
            verified_by: None,
            verified_at: None,
            remarks: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// New admin-created placeholder row (sub-track transitions)
    pub fn placeholder(
        student_id: Uuid,
        status: ApplicationStatus,
        company_name: &str,
    ) -> Self {
        let mut app = Self::new(student_id, ApplicationType::Summer, company_name.to_string());
        app.status = status;
        app.is_placeholder = true;
        app
    }
}

/// Insert an application row
pub async fn insert_application(
    conn: &mut SqliteConnection,
    app: &Application,
) -> EngineResult<()> {
    sqlx::query(
        r#"
        INSERT INTO internship_applications (
            guid, student_id, app_type, status, company_name, role,
            start_date, end_date, is_placeholder,
            previous_internship1_track, internship1_track_changed_by_admin_at,
            verified_by, verified_at, remarks, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(app.guid.to_string())
    .bind(app.student_id.to_string())
    .bind(app.app_type.as_str())
    .bind(app.status.as_str())
    .bind(&app.company_name)
    .bind(&app.role)
    .bind(&app.start_date)
    .bind(&app.end_date)
    .bind(app.is_placeholder as i64)
    .bind(app.previous_internship1_track.map(|t| t.as_str()))
    .bind(&app.internship1_track_changed_by_admin_at)
    .bind(&app.verified_by)
    .bind(&app.verified_at)
    .bind(&app.remarks)
    .bind(&app.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Student-facing submission (window checks happen in the request layer)
pub async fn submit_application(pool: &SqlitePool, app: &Application) -> EngineResult<()> {
    let mut conn = pool.acquire().await?;
    insert_application(&mut conn, app).await
}

/// Load application by guid
pub async fn load_application(
    pool: &SqlitePool,
    application_id: Uuid,
) -> EngineResult<Option<Application>> {
    let row = sqlx::query(&format!("{APPLICATION_COLUMNS} WHERE guid = ?"))
        .bind(application_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(application_from_row(&row)?)),
        None => Ok(None),
    }
}

/// The authoritative summer application: most recently created, any status
pub async fn latest_summer_application(
    conn: &mut SqliteConnection,
    student_id: Uuid,
) -> EngineResult<Option<Application>> {
    let row = sqlx::query(&format!(
        r#"{APPLICATION_COLUMNS}
        WHERE student_id = ? AND app_type = 'summer'
        ORDER BY created_at DESC, rowid DESC
        LIMIT 1
        "#,
    ))
    .bind(student_id.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(application_from_row(&row)?)),
        None => Ok(None),
    }
}

/// A student's non-terminal summer applications (should be at most one, but
/// the transition rule is "reject all found")
pub async fn open_summer_applications(
    conn: &mut SqliteConnection,
    student_id: Uuid,
) -> EngineResult<Vec<Application>> {
    let rows = sqlx::query(&format!(
        r#"{APPLICATION_COLUMNS}
        WHERE student_id = ? AND app_type = 'summer'
          AND status NOT IN ('verified_pass', 'verified_fail', 'absent')
        ORDER BY created_at
        "#,
    ))
    .bind(student_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(application_from_row).collect()
}

const APPLICATION_COLUMNS: &str = r#"
    SELECT guid, student_id, app_type, status, company_name, role,
           start_date, end_date, is_placeholder,
           previous_internship1_track, internship1_track_changed_by_admin_at,
           verified_by, verified_at, remarks, created_at
    FROM internship_applications
"#;

pub(crate) fn application_from_row(row: &SqliteRow) -> EngineResult<Application> {
    let app_type: String = row.get("app_type");
    let status: String = row.get("status");
    let is_placeholder: i64 = row.get("is_placeholder");
    let previous: Option<String> = row.get("previous_internship1_track");

    Ok(Application {
        guid: parse_uuid(row.get("guid"))?,
        student_id: parse_uuid(row.get("student_id"))?,
        app_type: ApplicationType::parse(&app_type)
            .ok_or_else(|| EngineError::Internal(format!("bad app_type: {app_type}")))?,
        status: ApplicationStatus::parse(&status)
            .ok_or_else(|| EngineError::Internal(format!("bad application status: {status}")))?,
        company_name: row.get("company_name"),
        role: row.get("role"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        is_placeholder: is_placeholder != 0,
        previous_internship1_track: previous
            .map(|s| {
                Internship1Track::parse(&s)
                    .ok_or_else(|| EngineError::Internal(format!("bad internship1 track: {s}")))
            })
            .transpose()?,
        internship1_track_changed_by_admin_at: row.get("internship1_track_changed_by_admin_at"),
        verified_by: row.get("verified_by"),
        verified_at: row.get("verified_at"),
        remarks: row.get("remarks"),
        created_at: row.get("created_at"),
    })
}
