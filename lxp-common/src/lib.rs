//! # LXP Common Library
//!
//! Shared code for the SCORM hosting service and its tools:
//! - Error types
//! - Configuration resolution
//! - Progress store
//! - SCORM entry-point resolver, runtime shim and launcher document

pub mod config;
pub mod error;
pub mod progress;
pub mod scorm;

pub use error::{Error, Result};
pub use progress::{InMemoryProgressStore, ProgressPatch, ProgressRecord, ProgressStore};
