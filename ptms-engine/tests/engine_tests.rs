//! End-to-end engine scenarios against in-memory SQLite

use ptms_common::db::settings;
use ptms_engine::db::{applications, groups, notifications, projects, students};
use ptms_engine::types::{
    ApplicationStatus, ApplicationType, InternshipOutcome, ProjectStatus, ProjectType, Track,
    VerificationStatus,
};
use ptms_engine::{EngineError, TransitionEngine};
use sqlx::SqlitePool;
use uuid::Uuid;

const YEAR: &str = "2026-27";

async fn setup() -> (SqlitePool, TransitionEngine) {
    let pool = SqlitePool::connect(":memory:").await.unwrap();
    ptms_common::db::init_tables(&pool).await.unwrap();
    settings::set_current_academic_year(&pool, YEAR.to_string())
        .await
        .unwrap();
    let engine = TransitionEngine::new(pool.clone());
    (pool, engine)
}

async fn seed_student(pool: &SqlitePool, roll: &str, chosen: Track) -> Uuid {
    let student = students::Student::new(
        roll.to_string(),
        format!("Student {roll}"),
        format!("{roll}@example.edu"),
        7,
    );
    students::create_student(pool, &student).await.unwrap();
    students::submit_track_choice(pool, student.guid, 7, YEAR, chosen)
        .await
        .unwrap();
    student.guid
}

async fn load_selection(pool: &SqlitePool, student_id: Uuid) -> students::TrackSelection {
    let mut conn = pool.acquire().await.unwrap();
    students::load_selection(&mut conn, student_id, 7, YEAR)
        .await
        .unwrap()
        .unwrap()
}

async fn latest_summer(pool: &SqlitePool, student_id: Uuid) -> Option<applications::Application> {
    let mut conn = pool.acquire().await.unwrap();
    applications::latest_summer_application(&mut conn, student_id)
        .await
        .unwrap()
}

async fn application_count(pool: &SqlitePool, student_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM internship_applications WHERE student_id = ?")
        .bind(student_id.to_string())
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn noop_finalize_is_idempotent() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE100", Track::Coursework).await;

    let project = projects::Project::new_for_student(
        ProjectType::Major1,
        student_id,
        "Compiler".to_string(),
    );
    projects::register_project(&pool, &project).await.unwrap();

    // Target equals the chosen (auto-finalized) track: confirm only.
    let first = engine
        .finalize_track(student_id, 7, "coursework", Some(VerificationStatus::Approved), None)
        .await
        .unwrap();
    assert_eq!(first.finalized_track, Some(Track::Coursework));
    assert!(first.previous_track.is_none());
    assert!(first.track_changed_by_admin_at.is_none());
    assert_eq!(first.verification_status, VerificationStatus::Approved);

    let second = engine
        .finalize_track(student_id, 7, "coursework", None, None)
        .await
        .unwrap();
    assert!(second.previous_track.is_none());
    assert!(second.track_changed_by_admin_at.is_none());

    let loaded = projects::load_project(&pool, project.guid).await.unwrap().unwrap();
    assert_eq!(loaded.status, ProjectStatus::Registered, "no cascade on no-op");
}

#[tokio::test]
async fn repeated_track_change_does_not_duplicate_change_markers() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE101", Track::Coursework).await;

    let changed = engine
        .finalize_track(student_id, 7, "internship", None, None)
        .await
        .unwrap();
    assert_eq!(changed.previous_track, Some(Track::Coursework));
    let first_stamp = changed.track_changed_by_admin_at.clone().unwrap();

    // Same target again: no new change recorded.
    let again = engine
        .finalize_track(student_id, 7, "internship", None, None)
        .await
        .unwrap();
    assert_eq!(again.previous_track, Some(Track::Coursework));
    assert_eq!(again.track_changed_by_admin_at, Some(first_stamp));

    // Toggling back infers the previous track from the latest finalized one.
    let back = engine
        .finalize_track(student_id, 7, "coursework", None, None)
        .await
        .unwrap();
    assert_eq!(back.finalized_track, Some(Track::Coursework));
    assert_eq!(back.previous_track, Some(Track::Internship));
}

#[tokio::test]
async fn cascade_resets_owned_and_group_projects() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE102", Track::Coursework).await;
    let teammate = seed_student(&pool, "21BCE103", Track::Coursework).await;
    let own_faculty = Uuid::new_v4();
    let group_faculty = Uuid::new_v4();

    let own = projects::Project::new_for_student(
        ProjectType::Major1,
        student_id,
        "Solo Work".to_string(),
    );
    projects::register_project(&pool, &own).await.unwrap();
    projects::allocate_faculty(&pool, own.guid, own_faculty).await.unwrap();
    sqlx::query("UPDATE projects SET deliverables = '[\"report.pdf\"]' WHERE guid = ?")
        .bind(own.guid.to_string())
        .execute(&pool)
        .await
        .unwrap();

    let group_id = groups::create_group(&pool, "Team A").await.unwrap();
    groups::add_group_member(&pool, group_id, student_id).await.unwrap();
    groups::add_group_member(&pool, group_id, teammate).await.unwrap();
    let shared = projects::Project::new_for_group(
        ProjectType::Major1,
        group_id,
        "Shared Work".to_string(),
    );
    projects::register_project(&pool, &shared).await.unwrap();
    projects::allocate_faculty(&pool, shared.guid, group_faculty).await.unwrap();

    let selection = engine
        .finalize_track(student_id, 7, "internship", None, None)
        .await
        .unwrap();

    assert_eq!(selection.finalized_track, Some(Track::Internship));
    assert_eq!(selection.previous_track, Some(Track::Coursework));
    assert_eq!(selection.internship_outcome, InternshipOutcome::Provisional);
    assert!(selection.require_sem8_coursework);

    for guid in [own.guid, shared.guid] {
        let p = projects::load_project(&pool, guid).await.unwrap().unwrap();
        assert_eq!(p.status, ProjectStatus::Cancelled);
        assert!(p.deliverables.is_empty());
        assert!(p.faculty_id.is_none());
        assert!(p.faculty_preferences.is_empty());
        assert_eq!(p.allocation_history.len(), 1, "audit history preserved");
        assert!(p.grade.is_none());
    }

    let own_reloaded = projects::load_project(&pool, own.guid).await.unwrap().unwrap();
    assert_eq!(own_reloaded.title, "Solo Work");

    for faculty in [own_faculty, group_faculty] {
        let list = notifications::list_for_faculty(&pool, faculty).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].notif_type, notifications::TYPE_PROJECT_CANCELLED);
        assert_eq!(list[0].student_id, Some(student_id));
    }
}

#[tokio::test]
async fn finalize_requires_prior_choice() {
    let (pool, engine) = setup().await;
    let student = students::Student::new(
        "21BCE104".to_string(),
        "No Choice".to_string(),
        "nochoice@example.edu".to_string(),
        7,
    );
    students::create_student(&pool, &student).await.unwrap();

    let err = engine
        .finalize_track(student.guid, 7, "internship", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NoChoiceSubmitted { semester: 7, .. }));
}

#[tokio::test]
async fn finalize_rejects_unknown_student_and_track() {
    let (pool, engine) = setup().await;

    let err = engine
        .finalize_track(Uuid::new_v4(), 7, "internship", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StudentNotFound(_)));

    let student_id = seed_student(&pool, "21BCE105", Track::Coursework).await;
    let err = engine
        .finalize_track(student_id, 7, "sabbatical", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTargetTrack(_)));
}

#[tokio::test]
async fn completed_project_blocks_subtrack_change() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE106", Track::Coursework).await;

    let mut project = projects::Project::new_for_student(
        ProjectType::Internship1,
        student_id,
        "Done".to_string(),
    );
    project.status = ProjectStatus::Completed;
    projects::register_project(&pool, &project).await.unwrap();

    let err = engine
        .change_internship1_track(student_id, "application", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ProjectAlreadyCompleted));

    assert_eq!(application_count(&pool, student_id).await, 0);
    let p = projects::load_project(&pool, project.guid).await.unwrap().unwrap();
    assert_eq!(p.status, ProjectStatus::Completed);
}

#[tokio::test]
async fn marker_application_created_when_none_exists() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE107", Track::Coursework).await;

    engine
        .change_internship1_track(student_id, "project", None)
        .await
        .unwrap();

    let marker = latest_summer(&pool, student_id).await.unwrap();
    assert_eq!(marker.status, ApplicationStatus::VerifiedFail);
    assert_eq!(marker.company_name, applications::MARKER_COMPANY);
    assert!(marker.is_placeholder);
    assert!(marker.previous_internship1_track.is_none());
    assert!(marker.internship1_track_changed_by_admin_at.is_some());
}

#[tokio::test]
async fn switch_to_application_cancels_project_and_creates_application() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE108", Track::Coursework).await;
    let faculty = Uuid::new_v4();

    let project = projects::Project::new_for_student(
        ProjectType::Internship1,
        student_id,
        "Institute Project".to_string(),
    );
    projects::register_project(&pool, &project).await.unwrap();
    projects::allocate_faculty(&pool, project.guid, faculty).await.unwrap();

    engine
        .change_internship1_track(student_id, "application", None)
        .await
        .unwrap();

    let p = projects::load_project(&pool, project.guid).await.unwrap().unwrap();
    assert_eq!(p.status, ProjectStatus::Cancelled);
    assert!(p.faculty_id.is_none());
    assert_eq!(p.allocation_history.len(), 1);

    let app = latest_summer(&pool, student_id).await.unwrap();
    assert_eq!(app.status, ApplicationStatus::Submitted);
    assert_eq!(
        app.previous_internship1_track,
        Some(ptms_engine::types::Internship1Track::Project)
    );

    let list = notifications::list_for_faculty(&pool, faculty).await.unwrap();
    assert_eq!(list.len(), 1);
}

#[tokio::test]
async fn terminal_application_is_superseded_not_reopened() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE109", Track::Coursework).await;

    let mut rejected = applications::Application::new(
        student_id,
        ApplicationType::Summer,
        "Acme Corp".to_string(),
    );
    rejected.status = ApplicationStatus::VerifiedFail;
    rejected.remarks = Some("insufficient documents".to_string());
    applications::submit_application(&pool, &rejected).await.unwrap();

    engine
        .change_internship1_track(student_id, "application", None)
        .await
        .unwrap();

    assert_eq!(application_count(&pool, student_id).await, 2);

    let fresh = latest_summer(&pool, student_id).await.unwrap();
    assert_ne!(fresh.guid, rejected.guid);
    assert_eq!(fresh.status, ApplicationStatus::Submitted);

    // The rejected row is history: nothing on it changed.
    let old = applications::load_application(&pool, rejected.guid)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(old.status, ApplicationStatus::VerifiedFail);
    assert_eq!(old.remarks.as_deref(), Some("insufficient documents"));
    assert_eq!(old.company_name, "Acme Corp");
    assert!(old.internship1_track_changed_by_admin_at.is_none());
}

#[tokio::test]
async fn nonterminal_application_is_reopened_in_place() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE110", Track::Coursework).await;

    let mut app = applications::Application::new(
        student_id,
        ApplicationType::Summer,
        "Globex".to_string(),
    );
    app.status = ApplicationStatus::NeedsInfo;
    applications::submit_application(&pool, &app).await.unwrap();

    engine
        .change_internship1_track(student_id, "application", Some("re-opened".to_string()))
        .await
        .unwrap();

    assert_eq!(application_count(&pool, student_id).await, 1, "no new row");

    let reopened = latest_summer(&pool, student_id).await.unwrap();
    assert_eq!(reopened.guid, app.guid);
    assert_eq!(reopened.status, ApplicationStatus::Submitted);
    assert_eq!(reopened.remarks.as_deref(), Some("re-opened"));
    assert_eq!(
        reopened.previous_internship1_track,
        Some(ptms_engine::types::Internship1Track::Application)
    );
}

#[tokio::test]
async fn switch_to_project_rejects_open_applications() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE111", Track::Coursework).await;

    let app = applications::Application::new(
        student_id,
        ApplicationType::Summer,
        "Initech".to_string(),
    );
    applications::submit_application(&pool, &app).await.unwrap();

    engine
        .change_internship1_track(student_id, "project", None)
        .await
        .unwrap();

    let updated = applications::load_application(&pool, app.guid)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, ApplicationStatus::VerifiedFail);
    assert!(updated.internship1_track_changed_by_admin_at.is_some());
    assert_eq!(application_count(&pool, student_id).await, 1);
}

#[tokio::test]
async fn switch_to_project_stamps_terminal_application_without_touching_status() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE112", Track::Coursework).await;

    let mut app = applications::Application::new(
        student_id,
        ApplicationType::Summer,
        "Hooli".to_string(),
    );
    app.status = ApplicationStatus::Absent;
    applications::submit_application(&pool, &app).await.unwrap();

    engine
        .change_internship1_track(student_id, "project", None)
        .await
        .unwrap();

    let updated = applications::load_application(&pool, app.guid)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, ApplicationStatus::Absent, "terminal status kept");
    assert!(updated.internship1_track_changed_by_admin_at.is_some());
    assert_eq!(application_count(&pool, student_id).await, 1, "no marker added");
}

#[tokio::test]
async fn subtrack_change_rejects_invalid_target() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE113", Track::Coursework).await;

    let err = engine
        .change_internship1_track(student_id, "hybrid", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTargetTrack(_)));
}

#[tokio::test]
async fn summer_approval_retires_competing_project() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE114", Track::Coursework).await;
    let faculty = Uuid::new_v4();

    let project = projects::Project::new_for_student(
        ProjectType::Internship1,
        student_id,
        "Competing".to_string(),
    );
    projects::register_project(&pool, &project).await.unwrap();
    projects::allocate_faculty(&pool, project.guid, faculty).await.unwrap();

    let mut app = applications::Application::new(
        student_id,
        ApplicationType::Summer,
        "Stark Industries".to_string(),
    );
    app.status = ApplicationStatus::PendingVerification;
    applications::submit_application(&pool, &app).await.unwrap();

    let outcome = engine
        .review_application(app.guid, "verified_pass", None, "admin@example.edu")
        .await
        .unwrap();

    assert_eq!(outcome.application.status, ApplicationStatus::VerifiedPass);
    assert!(outcome.application.verified_at.is_some());
    assert_eq!(outcome.application.verified_by.as_deref(), Some("admin@example.edu"));
    assert_eq!(outcome.project_retirement.unwrap(), Some(project.guid));
    outcome.outcome_sync.unwrap();

    let p = projects::load_project(&pool, project.guid).await.unwrap().unwrap();
    assert_eq!(p.status, ProjectStatus::Cancelled);

    let selection = load_selection(&pool, student_id).await;
    assert_eq!(selection.internship_outcome, InternshipOutcome::VerifiedPass);
    assert!(!selection.has_backlog);
}

#[tokio::test]
async fn re_approval_does_not_retire_again() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE115", Track::Coursework).await;

    let mut app = applications::Application::new(
        student_id,
        ApplicationType::Summer,
        "Wayne Enterprises".to_string(),
    );
    app.status = ApplicationStatus::VerifiedPass;
    applications::submit_application(&pool, &app).await.unwrap();

    let outcome = engine
        .review_application(app.guid, "verified_pass", None, "admin@example.edu")
        .await
        .unwrap();
    assert_eq!(outcome.project_retirement.unwrap(), None);
}

#[tokio::test]
async fn review_rejection_sets_backlog() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE116", Track::Coursework).await;

    let app = applications::Application::new(
        student_id,
        ApplicationType::Summer,
        "Umbrella".to_string(),
    );
    applications::submit_application(&pool, &app).await.unwrap();

    engine
        .review_application(app.guid, "verified_fail", Some("forged letter".to_string()), "admin")
        .await
        .unwrap();

    let selection = load_selection(&pool, student_id).await;
    assert_eq!(selection.internship_outcome, InternshipOutcome::VerifiedFail);
    assert!(selection.has_backlog);
}

#[tokio::test]
async fn review_nonterminal_does_not_stamp_verifier() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE117", Track::Coursework).await;

    let app = applications::Application::new(
        student_id,
        ApplicationType::Summer,
        "Cyberdyne".to_string(),
    );
    applications::submit_application(&pool, &app).await.unwrap();

    let outcome = engine
        .review_application(app.guid, "needs_info", Some("missing offer letter".to_string()), "admin")
        .await
        .unwrap();

    assert_eq!(outcome.application.status, ApplicationStatus::NeedsInfo);
    assert!(outcome.application.verified_at.is_none());
    assert!(outcome.application.verified_by.is_none());
}

#[tokio::test]
async fn review_rejects_unknown_status_and_application() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE118", Track::Coursework).await;

    let app = applications::Application::new(
        student_id,
        ApplicationType::Summer,
        "Oscorp".to_string(),
    );
    applications::submit_application(&pool, &app).await.unwrap();

    let err = engine
        .review_application(app.guid, "approved_maybe", None, "admin")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus(_)));

    let err = engine
        .review_application(Uuid::new_v4(), "verified_pass", None, "admin")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ApplicationNotFound(_)));
}

/// Round-trip scenario: coursework student with a registered major1 project
/// moved to internship by an admin.
#[tokio::test]
async fn round_trip_sem7_track_change() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE119", Track::Coursework).await;

    let project = projects::Project::new_for_student(
        ProjectType::Major1,
        student_id,
        "Database Engine".to_string(),
    );
    projects::register_project(&pool, &project).await.unwrap();

    let selection = engine
        .finalize_track(student_id, 7, "internship", None, None)
        .await
        .unwrap();

    assert_eq!(selection.previous_track, Some(Track::Coursework));
    assert_eq!(selection.finalized_track, Some(Track::Internship));
    assert_eq!(selection.internship_outcome, InternshipOutcome::Provisional);
    assert!(selection.require_sem8_coursework);
    assert!(selection.track_changed_by_admin_at.is_some());

    let p = projects::load_project(&pool, project.guid).await.unwrap().unwrap();
    assert_eq!(p.status, ProjectStatus::Cancelled);
    assert!(p.deliverables.is_empty());
    assert!(p.faculty_id.is_none());
    assert_eq!(p.title, "Database Engine");

    // The project never had a faculty allocated, so there is no one to tell.
    let notification_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM faculty_notifications")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(notification_count, 0, "no notification for unallocated projects");
}

/// Completed projects survive a semester track change untouched.
#[tokio::test]
async fn finalize_skips_completed_projects() {
    let (pool, engine) = setup().await;
    let student_id = seed_student(&pool, "21BCE120", Track::Coursework).await;

    let mut done = projects::Project::new_for_student(
        ProjectType::Major1,
        student_id,
        "Finished".to_string(),
    );
    done.status = ProjectStatus::Completed;
    done.grade = Some("A".to_string());
    projects::register_project(&pool, &done).await.unwrap();

    engine
        .finalize_track(student_id, 7, "internship", None, None)
        .await
        .unwrap();

    let p = projects::load_project(&pool, done.guid).await.unwrap().unwrap();
    assert_eq!(p.status, ProjectStatus::Completed);
    assert_eq!(p.grade.as_deref(), Some("A"));
}
