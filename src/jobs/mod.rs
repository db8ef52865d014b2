//! Job lifecycle and queue processing
//!
//! This module is the core of the runner:
//! - `QueueWatcher`: the polling loop over the queue folder
//! - `NotebookJob`: one job's claim → parse → validate → execute →
//!   inspect → archive lifecycle
//! - `validator`: fail-fast descriptor parameter checks
//! - `output_path`: time-partitioned output folder resolution
//! - `findings`: post-execution findings detection and archival

pub mod descriptor;
pub mod findings;
pub mod notebook_job;
pub mod output_path;
pub mod types;
pub mod validator;
pub mod watcher;

pub use findings::FindingsDetector;
pub use notebook_job::NotebookJob;
pub use types::{ExecOptions, ExecSection, IdentifierSpec, NotebookParams};
pub use watcher::QueueWatcher;
