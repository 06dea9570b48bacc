//! Track transition engine
//!
//! One engine instance per process, holding the shared pool. Each public
//! operation is invoked synchronously by a request handler or the admin CLI
//! and runs to completion or failure before returning. Cascade writes for
//! `finalize_track` and `change_internship1_track` are all-or-nothing within
//! one transaction; `review_application` deliberately commits its two
//! secondary effects independently (best-effort by design).

pub mod policy;

mod application_review;
mod cascade;
mod internship_track;
mod track_finalize;

pub use application_review::ReviewOutcome;

use sqlx::{Pool, Sqlite};

/// Orchestrates track transitions and their cascades
pub struct TransitionEngine {
    db: Pool<Sqlite>,
}

impl TransitionEngine {
    /// Create a new engine over the shared pool
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// Access the underlying pool (request handlers share it for reads)
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.db
    }
}
