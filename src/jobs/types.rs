//! Job parameter model
//!
//! A job descriptor is a YAML document with two top-level sections:
//! `papermill`, a mapping of notebook parameter name to value passed
//! verbatim to the execution engine, and `exec`, the control section
//! naming the notebook to run plus an allow-listed set of engine options.
//! After validation the raw sections are converted into the typed model
//! below; unrecognized `exec` keys are silently ignored.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use uuid::Uuid;

use crate::errors::DescriptorError;
use crate::jobs::descriptor::ClaimedDescriptor;

/// Which papermill values compose the output identifier
///
/// Descriptors may name a single key or an ordered sequence of keys.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum IdentifierSpec {
    Single(String),
    Many(Vec<String>),
}

impl Default for IdentifierSpec {
    fn default() -> Self {
        IdentifierSpec::Many(Vec::new())
    }
}

impl IdentifierSpec {
    /// The identifier keys in declaration order
    pub fn keys(&self) -> &[String] {
        match self {
            IdentifierSpec::Single(key) => std::slice::from_ref(key),
            IdentifierSpec::Many(keys) => keys,
        }
    }
}

/// Allow-listed execution-engine options
///
/// Only these keys are forwarded to the engine; anything else in the
/// `exec` section is ignored rather than rejected.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExecOptions {
    pub engine_name: Option<String>,
    pub request_save_on_cell_execute: Option<bool>,
    pub autosave_cell_every: Option<u32>,
    pub kernel_name: Option<String>,
    pub language: Option<String>,
    pub progress_bar: Option<bool>,
    pub log_output: Option<bool>,
    pub report_mode: Option<bool>,
}

/// Typed `exec` section of a descriptor
#[derive(Debug, Clone, Deserialize)]
pub struct ExecSection {
    /// Notebook to run, relative to the notebook root
    pub notebook: String,
    #[serde(default)]
    pub identifier: IdentifierSpec,
    #[serde(default)]
    pub kernel: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(flatten)]
    pub options: ExecOptions,
}

/// Parsed, validated representation of one job
#[derive(Debug, Clone)]
pub struct NotebookParams {
    /// Notebook input parameters, passed verbatim to the engine
    pub papermill: Mapping,
    /// Control section
    pub exec: ExecSection,
    /// Derived, filesystem-safe identifier for output naming
    pub identifier: String,
    /// Original descriptor path, pre-claim
    pub source_file: PathBuf,
    /// Claimed descriptor path, owned by this job for its lifetime
    pub working_file: PathBuf,
    /// Job id used for logging correlation and the working file name
    pub job_id: Uuid,
}

impl NotebookParams {
    /// Convert a validated claimed descriptor into the typed model
    pub fn from_claimed(
        claimed: ClaimedDescriptor,
        job_id: Uuid,
    ) -> Result<Self, DescriptorError> {
        let exec_value = claimed
            .exec
            .unwrap_or_else(|| Value::Mapping(Mapping::new()));
        let exec: ExecSection =
            serde_yaml::from_value(exec_value).map_err(DescriptorError::Options)?;

        let papermill = match claimed.papermill {
            Some(Value::Mapping(mapping)) => mapping,
            _ => Mapping::new(),
        };

        Ok(Self {
            papermill,
            exec,
            identifier: claimed.identifier,
            source_file: claimed.source_file,
            working_file: claimed.working_file,
            job_id,
        })
    }

    /// Name of the notebook to run
    pub fn notebook(&self) -> &str {
        &self.exec.notebook
    }

    /// Kernel requested for the run, if any
    pub fn kernel(&self) -> Option<&str> {
        self.exec.kernel.as_deref()
    }

    /// Programming language of the notebook job
    pub fn language(&self) -> &str {
        self.exec.language.as_deref().unwrap_or("python")
    }
}
