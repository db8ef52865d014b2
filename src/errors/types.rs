//! Error type definitions for the notebook job runner
//!
//! Validation failures mirror the descriptor check table: each variant
//! names the section and item that failed so the log line is enough to fix
//! the descriptor without reading runner source.

use std::path::PathBuf;

use thiserror::Error;

/// Parameter validation failures
///
/// These are authoring mistakes in the job descriptor, not runtime
/// failures. A rejected job is abandoned under its claimed working name
/// and never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Section is missing or not a mapping
    #[error("failed check {section}: is-type (not a mapping)")]
    NotMapping { section: &'static str },

    /// Section is present but empty
    #[error("failed check {section}: not-empty")]
    Empty { section: &'static str },

    /// Item has the wrong type
    #[error("failed check {section}/{item}: is-type (expected {expected})")]
    WrongType {
        section: &'static str,
        item: &'static str,
        expected: &'static str,
    },

    /// No identifier keys are configured, so no output identifier can be
    /// derived
    #[error("failed check exec/identifier: key-exists (no identifier keys configured)")]
    IdentifierUnset,

    /// An identifier key does not resolve to a truthy papermill value
    #[error("failed check exec/identifier: key-exists ('{key}' missing or empty in papermill)")]
    IdentifierKeyMissing { key: String },
}

/// Failures while claiming or decoding a job descriptor
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// The claim rename failed (another watcher may have won the race)
    #[error("failed to claim descriptor {path}: {source}")]
    Claim {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The claimed working file could not be read
    #[error("failed to read working file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The descriptor body is not valid YAML
    #[error("descriptor is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The descriptor document root is not a mapping
    #[error("descriptor root is not a mapping")]
    NotAMapping,

    /// A recognized exec key carries an unusable value
    #[error("exec section options are invalid: {0}")]
    Options(#[source] serde_yaml::Error),

    /// An identifier key names a papermill value that is not a scalar
    #[error("identifier key '{key}' does not name a scalar papermill value")]
    NonScalarIdentifier { key: String },
}

/// Failures from the external notebook execution engine
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The engine binary could not be spawned
    #[error("failed to spawn notebook engine '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran and reported failure
    #[error("notebook engine exited with code {code:?}: {stderr}")]
    Engine { code: Option<i32>, stderr: String },

    /// The parameter mapping could not be encoded for the engine
    #[error("failed to encode notebook parameters: {0}")]
    Parameters(#[from] serde_yaml::Error),
}

/// Failures from the notebook-to-HTML renderer
#[derive(Error, Debug)]
pub enum RenderError {
    /// The renderer binary could not be spawned
    #[error("failed to spawn notebook renderer '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The renderer ran and reported failure
    #[error("notebook renderer exited with code {code:?}: {stderr}")]
    Renderer { code: Option<i32>, stderr: String },

    /// The rendered output could not be written
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures while extracting scraps from an executed notebook
#[derive(Error, Debug)]
pub enum ScrapError {
    /// The executed artifact could not be read
    #[error("failed to read executed notebook {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The executed artifact is not valid notebook JSON
    #[error("executed notebook is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Umbrella error for one job's lifecycle
///
/// This is what `NotebookJob` construction and `run` return and what the
/// watcher logs at its per-job isolation boundary.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("parameter validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("job descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("notebook execution failed: {0}")]
    Execution(#[from] ExecutionError),

    #[error("findings render failed: {0}")]
    Render(#[from] RenderError),

    #[error("scrap inspection failed: {0}")]
    Scraps(#[from] ScrapError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
