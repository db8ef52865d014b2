//! Centralized error handling for the notebook job runner
//!
//! Per-job failures are typed so the watcher can log the offending
//! section/item/check for descriptor authoring mistakes, while engine and
//! filesystem failures keep their source errors attached.
//!
//! # Error Categories
//!
//! - **Validation Errors**: job descriptor authoring mistakes
//! - **Descriptor Errors**: claim/read/decode failures
//! - **Execution Errors**: the external notebook engine failed
//! - **Render / Scrap Errors**: findings-path collaborators failed

pub mod types;

pub use types::*;

/// Convenience type alias for per-job Results
pub type JobResult<T> = Result<T, JobError>;
