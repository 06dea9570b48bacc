//! Project group membership
//!
//! Read-only from the engine's perspective: cascades resolve membership via
//! these lookups but never mutate groups.

use crate::error::EngineResult;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Create a project group, returning its guid
pub async fn create_group(pool: &SqlitePool, name: &str) -> EngineResult<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query("INSERT INTO project_groups (guid, name, created_at) VALUES (?, ?, CURRENT_TIMESTAMP)")
        .bind(guid.to_string())
        .bind(name)
        .execute(pool)
        .await?;
    Ok(guid)
}

/// Add an active member to a group
pub async fn add_group_member(
    pool: &SqlitePool,
    group_id: Uuid,
    student_id: Uuid,
) -> EngineResult<()> {
    sqlx::query("INSERT INTO group_members (group_id, student_id, active) VALUES (?, ?, 1)")
        .bind(group_id.to_string())
        .bind(student_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Mark a membership active/inactive (students leaving a group keep the row)
pub async fn set_member_active(
    pool: &SqlitePool,
    group_id: Uuid,
    student_id: Uuid,
    active: bool,
) -> EngineResult<()> {
    sqlx::query("UPDATE group_members SET active = ? WHERE group_id = ? AND student_id = ?")
        .bind(active as i64)
        .bind(group_id.to_string())
        .bind(student_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Is the student an active member of the group?
pub async fn is_member(pool: &SqlitePool, group_id: Uuid, student_id: Uuid) -> EngineResult<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM group_members WHERE group_id = ? AND student_id = ? AND active = 1",
    )
    .bind(group_id.to_string())
    .bind(student_id.to_string())
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}
