//! # PTMS Common Library
//!
//! Shared code for the Project & Track Management System:
//! - Error type used across crates
//! - Configuration loading and root folder resolution
//! - Database pool initialization and schema creation
//! - Settings (key/value config store) accessors

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
