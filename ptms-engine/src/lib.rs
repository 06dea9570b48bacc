//! # PTMS Engine
//!
//! Track Transition & Project-Lifecycle Consistency Engine.
//!
//! Students move between mutually exclusive academic tracks (internship vs
//! coursework) across semesters 7 and 8. Each transition must atomically
//! cancel or reset the dependent records tied to the track being left:
//! project registrations (individually owned or group-shared), faculty
//! allocations, internship applications, and the notifications and audit
//! fields that hang off them.
//!
//! The engine exposes three operations:
//! - [`TransitionEngine::finalize_track`]: admin confirms or overrides a
//!   student's semester track, cascading over the previous track's projects.
//! - [`TransitionEngine::change_internship1_track`]: moves a coursework
//!   student between the Internship-1 project and application sub-tracks.
//! - [`TransitionEngine::review_application`]: application review status
//!   transition, with a best-effort cross-track effect (summer approval
//!   retires the competing Internship-1 project).

pub mod db;
pub mod engine;
pub mod error;
pub mod types;

pub use engine::TransitionEngine;
pub use error::{EngineError, EngineResult};
