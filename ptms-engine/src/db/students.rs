//! Student and track-selection database operations

use crate::error::{EngineError, EngineResult};
use crate::types::{InternshipOutcome, Track, VerificationStatus};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

/// Student record
#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub guid: Uuid,
    pub roll_number: String,
    pub name: String,
    pub email: String,
    pub current_semester: i64,
}

impl Student {
    pub fn new(roll_number: String, name: String, email: String, current_semester: i64) -> Self {
        Self {
            guid: Uuid::new_v4(),
            roll_number,
            name,
            email,
            current_semester,
        }
    }
}

/// Per-(semester, academic year) track selection
///
/// `previous_track` is a single-slot undo buffer, not a log: it is set iff
/// `track_changed_by_admin_at` is set, and differs from `finalized_track`
/// whenever both are present.
#[derive(Debug, Clone, Serialize)]
pub struct TrackSelection {
    pub guid: Uuid,
    pub student_id: Uuid,
    pub semester: i64,
    pub academic_year: String,
    pub chosen_track: Track,
    pub finalized_track: Option<Track>,
    pub previous_track: Option<Track>,
    pub track_changed_by_admin_at: Option<String>,
    pub verification_status: VerificationStatus,
    pub internship_outcome: InternshipOutcome,
    pub require_sem8_coursework: bool,
    pub has_backlog: bool,
    pub remarks: Option<String>,
}

/// Save a new student
pub async fn create_student(pool: &SqlitePool, student: &Student) -> EngineResult<()> {
    sqlx::query(
        r#"
        INSERT INTO students (guid, roll_number, name, email, current_semester, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(student.guid.to_string())
    .bind(&student.roll_number)
    .bind(&student.name)
    .bind(&student.email)
    .bind(student.current_semester)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load student by guid
pub async fn load_student(pool: &SqlitePool, student_id: Uuid) -> EngineResult<Option<Student>> {
    let row = sqlx::query(
        "SELECT guid, roll_number, name, email, current_semester FROM students WHERE guid = ?",
    )
    .bind(student_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(Student {
            guid: parse_uuid(row.get("guid"))?,
            roll_number: row.get("roll_number"),
            name: row.get("name"),
            email: row.get("email"),
            current_semester: row.get("current_semester"),
        })),
        None => Ok(None),
    }
}

/// Record the student's own track choice for a semester
///
/// Upserts on (student, semester, academic year): re-submitting before the
/// admin finalizes simply replaces `chosen_track`.
pub async fn submit_track_choice(
    pool: &SqlitePool,
    student_id: Uuid,
    semester: i64,
    academic_year: &str,
    chosen: Track,
) -> EngineResult<TrackSelection> {
    sqlx::query(
        r#"
        INSERT INTO track_selections (guid, student_id, semester, academic_year, chosen_track, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(student_id, semester, academic_year) DO UPDATE SET
            chosen_track = excluded.chosen_track,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(student_id.to_string())
    .bind(semester)
    .bind(academic_year)
    .bind(chosen.as_str())
    .execute(pool)
    .await?;

    let mut conn = pool.acquire().await?;
    load_selection(&mut conn, student_id, semester, academic_year)
        .await?
        .ok_or_else(|| EngineError::Internal("track selection missing after upsert".to_string()))
}

/// Load the track selection for (student, semester, academic year)
pub async fn load_selection(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    semester: i64,
    academic_year: &str,
) -> EngineResult<Option<TrackSelection>> {
    let row = sqlx::query(
        r#"
        SELECT guid, student_id, semester, academic_year, chosen_track, finalized_track,
               previous_track, track_changed_by_admin_at, verification_status,
               internship_outcome, require_sem8_coursework, has_backlog, remarks
        FROM track_selections
        WHERE student_id = ? AND semester = ? AND academic_year = ?
        "#,
    )
    .bind(student_id.to_string())
    .bind(semester)
    .bind(academic_year)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(selection_from_row(&row)?)),
        None => Ok(None),
    }
}

pub(crate) fn selection_from_row(row: &SqliteRow) -> EngineResult<TrackSelection> {
    let chosen: String = row.get("chosen_track");
    let finalized: Option<String> = row.get("finalized_track");
    let previous: Option<String> = row.get("previous_track");
    let verification: String = row.get("verification_status");
    let outcome: String = row.get("internship_outcome");
    let require_sem8: i64 = row.get("require_sem8_coursework");
    let has_backlog: i64 = row.get("has_backlog");

    Ok(TrackSelection {
        guid: parse_uuid(row.get("guid"))?,
        student_id: parse_uuid(row.get("student_id"))?,
        semester: row.get("semester"),
        academic_year: row.get("academic_year"),
        chosen_track: parse_track(&chosen)?,
        finalized_track: finalized.as_deref().map(parse_track).transpose()?,
        previous_track: previous.as_deref().map(parse_track).transpose()?,
        track_changed_by_admin_at: row.get("track_changed_by_admin_at"),
        verification_status: VerificationStatus::parse(&verification)
            .ok_or_else(|| EngineError::Internal(format!("bad verification_status: {verification}")))?,
        internship_outcome: InternshipOutcome::parse(&outcome)
            .ok_or_else(|| EngineError::Internal(format!("bad internship_outcome: {outcome}")))?,
        require_sem8_coursework: require_sem8 != 0,
        has_backlog: has_backlog != 0,
        remarks: row.get("remarks"),
    })
}

fn parse_track(s: &str) -> EngineResult<Track> {
    Track::parse(s).ok_or_else(|| EngineError::Internal(format!("bad track value: {s}")))
}

pub(crate) fn parse_uuid(s: String) -> EngineResult<Uuid> {
    Uuid::parse_str(&s).map_err(|e| EngineError::Internal(format!("invalid guid: {e}")))
}
