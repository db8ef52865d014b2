//! External collaborator boundaries
//!
//! The notebook execution engine and the HTML renderer are external
//! programs reached through traits, so tests can substitute mocks and
//! deployments can point at wrapper scripts. Scrap extraction reads the
//! executed artifact directly since a notebook file is plain JSON.

pub mod html;
pub mod papermill;
pub mod scraps;

pub use html::{HtmlRenderer, NbConvertCli};
pub use papermill::{ExecutionRequest, NotebookExecutor, PapermillCli};
