//! Domain enums shared by the db and engine modules
//!
//! All enums are stored as TEXT; `as_str`/`parse` pairs define the on-disk
//! values. Parsing an unknown value is a data error surfaced by the caller.

use serde::{Deserialize, Serialize};

/// Semester-level academic track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Internship,
    Coursework,
}

impl Track {
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Internship => "internship",
            Track::Coursework => "coursework",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "internship" => Some(Track::Internship),
            "coursework" => Some(Track::Coursework),
            _ => None,
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internship-1 sub-track for coursework students: institute-faculty project
/// vs external/summer application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Internship1Track {
    Project,
    Application,
}

impl Internship1Track {
    pub fn as_str(&self) -> &'static str {
        match self {
            Internship1Track::Project => "project",
            Internship1Track::Application => "application",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "project" => Some(Internship1Track::Project),
            "application" => Some(Internship1Track::Application),
            _ => None,
        }
    }
}

impl std::fmt::Display for Internship1Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Major1,
    Major2,
    Internship1,
    Internship2,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Major1 => "major1",
            ProjectType::Major2 => "major2",
            ProjectType::Internship1 => "internship1",
            ProjectType::Internship2 => "internship2",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "major1" => Some(ProjectType::Major1),
            "major2" => Some(ProjectType::Major2),
            "internship1" => Some(ProjectType::Internship1),
            "internship2" => Some(ProjectType::Internship2),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project lifecycle
///
/// Forward chain `registered → faculty_allocated → active → completed`;
/// `cancelled` is a sink reachable from any non-terminal state and is never
/// re-entered into the chain (re-entry means a fresh registration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Registered,
    FacultyAllocated,
    Active,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Registered => "registered",
            ProjectStatus::FacultyAllocated => "faculty_allocated",
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "registered" => Some(ProjectStatus::Registered),
            "faculty_allocated" => Some(ProjectStatus::FacultyAllocated),
            "active" => Some(ProjectStatus::Active),
            "completed" => Some(ProjectStatus::Completed),
            "cancelled" => Some(ProjectStatus::Cancelled),
            _ => None,
        }
    }

    /// Completed and cancelled projects are immutable to cascades
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Cancelled)
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internship application kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationType {
    #[serde(rename = "6month")]
    SixMonth,
    #[serde(rename = "summer")]
    Summer,
}

impl ApplicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationType::SixMonth => "6month",
            ApplicationType::Summer => "summer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "6month" => Some(ApplicationType::SixMonth),
            "summer" => Some(ApplicationType::Summer),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application review lifecycle
///
/// `needs_info` and `pending_verification` are re-enterable from
/// `submitted`; the three verified states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    NeedsInfo,
    PendingVerification,
    VerifiedPass,
    VerifiedFail,
    Absent,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::NeedsInfo => "needs_info",
            ApplicationStatus::PendingVerification => "pending_verification",
            ApplicationStatus::VerifiedPass => "verified_pass",
            ApplicationStatus::VerifiedFail => "verified_fail",
            ApplicationStatus::Absent => "absent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(ApplicationStatus::Submitted),
            "needs_info" => Some(ApplicationStatus::NeedsInfo),
            "pending_verification" => Some(ApplicationStatus::PendingVerification),
            "verified_pass" => Some(ApplicationStatus::VerifiedPass),
            "verified_fail" => Some(ApplicationStatus::VerifiedFail),
            "absent" => Some(ApplicationStatus::Absent),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::VerifiedPass
                | ApplicationStatus::VerifiedFail
                | ApplicationStatus::Absent
        )
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admin verification of a track selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    NeedsInfo,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::NeedsInfo => "needs_info",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(VerificationStatus::Pending),
            "needs_info" => Some(VerificationStatus::NeedsInfo),
            "approved" => Some(VerificationStatus::Approved),
            "rejected" => Some(VerificationStatus::Rejected),
            _ => None,
        }
    }
}

/// Internship outcome derived from downstream application review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InternshipOutcome {
    Provisional,
    VerifiedPass,
    VerifiedFail,
    Absent,
}

impl InternshipOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            InternshipOutcome::Provisional => "provisional",
            InternshipOutcome::VerifiedPass => "verified_pass",
            InternshipOutcome::VerifiedFail => "verified_fail",
            InternshipOutcome::Absent => "absent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "provisional" => Some(InternshipOutcome::Provisional),
            "verified_pass" => Some(InternshipOutcome::VerifiedPass),
            "verified_fail" => Some(InternshipOutcome::VerifiedFail),
            "absent" => Some(InternshipOutcome::Absent),
            _ => None,
        }
    }
}
