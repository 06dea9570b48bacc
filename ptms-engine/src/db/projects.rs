//! Project database operations
//!
//! Projects are owned either by one student or by a group; cascades over
//! group projects resolve active membership at cascade time.

use crate::db::students::parse_uuid;
use crate::error::{EngineError, EngineResult};
use crate::types::{ProjectStatus, ProjectType};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

/// One entry in a project's append-only allocation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEvent {
    /// "presented", "passed" or "chosen"
    pub event: String,
    pub faculty_id: Uuid,
    pub at: String,
}

/// Project record
///
/// On cancellation the workflow state (faculty, preferences, deliverables,
/// grade, feedback, evaluation, deadlines) is cleared; identity and audit
/// fields (title, description, domain, start_date, allocation_history,
/// created_at) are preserved.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub guid: Uuid,
    pub project_type: ProjectType,
    pub status: ProjectStatus,
    pub student_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub faculty_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub domain: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub submission_deadline: Option<String>,
    pub grade: Option<String>,
    pub feedback: Option<String>,
    pub evaluated_by: Option<Uuid>,
    pub evaluated_at: Option<String>,
    pub deliverables: Vec<String>,
    pub allocation_history: Vec<AllocationEvent>,
    pub faculty_preferences: Vec<Uuid>,
}

impl Project {
    /// New individually owned project registration
    pub fn new_for_student(project_type: ProjectType, student_id: Uuid, title: String) -> Self {
        Self::new(project_type, Some(student_id), None, title)
    }

    /// New group-shared project registration
    pub fn new_for_group(project_type: ProjectType, group_id: Uuid, title: String) -> Self {
        Self::new(project_type, None, Some(group_id), title)
    }

    fn new(
        project_type: ProjectType,
        student_id: Option<Uuid>,
        group_id: Option<Uuid>,
        title: String,
    ) -> Self {
        Self {
            guid: Uuid::new_v4(),
            project_type,
            status: ProjectStatus::Registered,
            student_id,
            group_id,
            faculty_id: None,
            title,
            description: None,
            domain: None,
            start_date: None,
            end_date: None,
            submission_deadline: None,
            grade: None,
            feedback: None,
            evaluated_by: None,
            evaluated_at: None,
            deliverables: Vec::new(),
            allocation_history: Vec::new(),
            faculty_preferences: Vec::new(),
        }
    }
}

/// Save a new project registration
pub async fn register_project(pool: &SqlitePool, project: &Project) -> EngineResult<()> {
    sqlx::query(
        r#"
        INSERT INTO projects (
            guid, project_type, status, student_id, group_id, faculty_id,
            title, description, domain, start_date, end_date, submission_deadline,
            grade, feedback, evaluated_by, evaluated_at,
            deliverables, allocation_history, faculty_preferences,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(project.guid.to_string())
    .bind(project.project_type.as_str())
    .bind(project.status.as_str())
    .bind(project.student_id.map(|id| id.to_string()))
    .bind(project.group_id.map(|id| id.to_string()))
    .bind(project.faculty_id.map(|id| id.to_string()))
    .bind(&project.title)
    .bind(&project.description)
    .bind(&project.domain)
    .bind(&project.start_date)
    .bind(&project.end_date)
    .bind(&project.submission_deadline)
    .bind(&project.grade)
    .bind(&project.feedback)
    .bind(project.evaluated_by.map(|id| id.to_string()))
    .bind(&project.evaluated_at)
    .bind(to_json(&project.deliverables)?)
    .bind(to_json(&project.allocation_history)?)
    .bind(to_json(&project.faculty_preferences)?)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load project by guid
pub async fn load_project(pool: &SqlitePool, project_id: Uuid) -> EngineResult<Option<Project>> {
    let row = sqlx::query(&format!("{PROJECT_COLUMNS} WHERE guid = ?"))
        .bind(project_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(project_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Find a student's non-cancelled projects of the given types
///
/// Matches direct ownership and group ownership through an active
/// membership. Completed projects are included so callers can enforce the
/// completed-project guard; cancelled rows are permanently out.
pub async fn find_cascade_projects(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    types: &[ProjectType],
) -> EngineResult<Vec<Project>> {
    if types.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; types.len()].join(", ");
    let sql = format!(
        r#"{PROJECT_COLUMNS}
        WHERE project_type IN ({placeholders})
          AND status != 'cancelled'
          AND (
              student_id = ?
              OR group_id IN (
                  SELECT group_id FROM group_members
                  WHERE student_id = ? AND active = 1
              )
          )
        ORDER BY created_at
        "#,
    );

    let mut query = sqlx::query(&sql);
    for ty in types {
        query = query.bind(ty.as_str());
    }
    let rows = query
        .bind(student_id.to_string())
        .bind(student_id.to_string())
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(project_from_row).collect()
}

/// Allocate a faculty to a project and append the allocation-history event
pub async fn allocate_faculty(
    pool: &SqlitePool,
    project_id: Uuid,
    faculty_id: Uuid,
) -> EngineResult<()> {
    let project = load_project(pool, project_id)
        .await?
        .ok_or(EngineError::ProjectNotFound(project_id))?;

    let mut history = project.allocation_history;
    history.push(AllocationEvent {
        event: "chosen".to_string(),
        faculty_id,
        at: chrono::Utc::now().to_rfc3339(),
    });

    sqlx::query(
        r#"
        UPDATE projects
        SET status = 'faculty_allocated',
            faculty_id = ?,
            allocation_history = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(faculty_id.to_string())
    .bind(to_json(&history)?)
    .bind(project_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

const PROJECT_COLUMNS: &str = r#"
    SELECT guid, project_type, status, student_id, group_id, faculty_id,
           title, description, domain, start_date, end_date, submission_deadline,
           grade, feedback, evaluated_by, evaluated_at,
           deliverables, allocation_history, faculty_preferences
    FROM projects
"#;

pub(crate) fn project_from_row(row: &SqliteRow) -> EngineResult<Project> {
    let project_type: String = row.get("project_type");
    let status: String = row.get("status");
    let student_id: Option<String> = row.get("student_id");
    let group_id: Option<String> = row.get("group_id");
    let faculty_id: Option<String> = row.get("faculty_id");
    let evaluated_by: Option<String> = row.get("evaluated_by");
    let deliverables: String = row.get("deliverables");
    let allocation_history: String = row.get("allocation_history");
    let faculty_preferences: String = row.get("faculty_preferences");

    Ok(Project {
        guid: parse_uuid(row.get("guid"))?,
        project_type: ProjectType::parse(&project_type)
            .ok_or_else(|| EngineError::Internal(format!("bad project_type: {project_type}")))?,
        status: ProjectStatus::parse(&status)
            .ok_or_else(|| EngineError::Internal(format!("bad project status: {status}")))?,
        student_id: student_id.map(parse_uuid).transpose()?,
        group_id: group_id.map(parse_uuid).transpose()?,
        faculty_id: faculty_id.map(parse_uuid).transpose()?,
        title: row.get("title"),
        description: row.get("description"),
        domain: row.get("domain"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        submission_deadline: row.get("submission_deadline"),
        grade: row.get("grade"),
        feedback: row.get("feedback"),
        evaluated_by: evaluated_by.map(parse_uuid).transpose()?,
        evaluated_at: row.get("evaluated_at"),
        deliverables: from_json(&deliverables)?,
        allocation_history: from_json(&allocation_history)?,
        faculty_preferences: from_json(&faculty_preferences)?,
    })
}

fn to_json<T: Serialize>(value: &T) -> EngineResult<String> {
    serde_json::to_string(value).map_err(|e| EngineError::Internal(format!("JSON encode: {e}")))
}

fn from_json<T: for<'de> Deserialize<'de>>(value: &str) -> EngineResult<T> {
    serde_json::from_str(value).map_err(|e| EngineError::Internal(format!("JSON decode: {e}")))
}
