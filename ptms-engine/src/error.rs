//! Error types for the transition engine

use thiserror::Error;
use uuid::Uuid;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error taxonomy
///
/// `StudentNotFound`/`ProjectNotFound`/`ApplicationNotFound` map to
/// 404-class responses in the request layer; the invalid-state variants map
/// to 400-class; `Transaction` is retryable (no partial state persists for
/// the atomic operations).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Student not found: {0}")]
    StudentNotFound(Uuid),

    #[error("Project not found: {0}")]
    ProjectNotFound(Uuid),

    #[error("Application not found: {0}")]
    ApplicationNotFound(Uuid),

    /// Student has not submitted a track choice for the semester
    #[error("No track choice submitted for semester {semester} ({academic_year})")]
    NoChoiceSubmitted { semester: i64, academic_year: String },

    /// Application review status outside the allowed set
    #[error("Invalid application status: {0}")]
    InvalidStatus(String),

    #[error("Invalid target track: {0}")]
    InvalidTargetTrack(String),

    /// A completed Internship-1 project blocks any sub-track change; this
    /// project type only completes across a semester boundary, so a match
    /// here means stale data from the prior semester.
    #[error("Internship 1 project already completed; track cannot be changed")]
    ProjectAlreadyCompleted,

    /// Commit/abort failure from the store; the whole operation may be
    /// retried for the atomic paths.
    #[error("Transaction failed: {0}")]
    Transaction(#[from] sqlx::Error),

    #[error(transparent)]
    Common(#[from] ptms_common::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
