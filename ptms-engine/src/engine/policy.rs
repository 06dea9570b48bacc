//! Static track policy tables
//!
//! Single source of truth for the workflow-flag effects of finalizing a
//! track and for which project types belong to a track at each semester.

use crate::types::{ApplicationStatus, InternshipOutcome, ProjectType, Track};

/// Flag effects of finalizing `(semester, target_track)`
///
/// `None` means the flag is left unchanged by the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackPolicy {
    pub require_sem8_coursework: Option<bool>,
    pub has_backlog: Option<bool>,
}

/// Policy table:
///
/// | semester | target track | require_sem8_coursework | has_backlog |
/// |---|---|---|---|
/// | 7 | internship | true | set later from verification outcome |
/// | 7 | coursework | false | false |
/// | 8 | internship | unchanged | unchanged |
/// | 8 | coursework | unchanged | unchanged |
pub fn policy_for(semester: i64, target: Track) -> TrackPolicy {
    match (semester, target) {
        (7, Track::Internship) => TrackPolicy {
            require_sem8_coursework: Some(true),
            has_backlog: None,
        },
        (7, Track::Coursework) => TrackPolicy {
            require_sem8_coursework: Some(false),
            has_backlog: Some(false),
        },
        _ => TrackPolicy {
            require_sem8_coursework: None,
            has_backlog: None,
        },
    }
}

/// Project types tied to a track at a semester; these are the cascade
/// targets when the track is left.
pub fn cascade_project_types(semester: i64, track: Track) -> &'static [ProjectType] {
    match (semester, track) {
        (7, Track::Coursework) => &[ProjectType::Major1, ProjectType::Internship1],
        (7, Track::Internship) => &[ProjectType::Internship2],
        (8, Track::Coursework) => &[ProjectType::Major2],
        (8, Track::Internship) => &[ProjectType::Internship2],
        _ => &[],
    }
}

/// Derive (internship outcome, backlog flag) from an application review
/// status; used by the best-effort outcome sync after a review.
pub fn outcome_for_status(status: ApplicationStatus) -> (InternshipOutcome, bool) {
    match status {
        ApplicationStatus::VerifiedPass => (InternshipOutcome::VerifiedPass, false),
        ApplicationStatus::VerifiedFail => (InternshipOutcome::VerifiedFail, true),
        ApplicationStatus::Absent => (InternshipOutcome::Absent, true),
        _ => (InternshipOutcome::Provisional, false),
    }
}
