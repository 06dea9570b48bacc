//! Database access for the transition engine
//!
//! One module per entity. Functions that cascade callers must be able to run
//! inside a transaction take `&mut SqliteConnection`; pool-facing CRUD used
//! by the CLI and request handlers takes `&SqlitePool`.

pub mod applications;
pub mod groups;
pub mod notifications;
pub mod projects;
pub mod students;
